//! The processing engine: pre-loop validation and the block-rate main loop.
//!
//! One iteration = read a block, slice and deliver MIDI, drive the plugin
//! chain, write the result, advance the transport. The loop ends when the
//! input runs dry, or, when a MIDI sequence is present, when the sequence
//! does: MIDI end-of-sequence overrides the audio verdict.

use crate::error::{Error, Result};
use bounce_core::{AudioClock, AudioSettings, SampleBuffer, TaskTimer};
use bounce_io::{open_sample_source, silence_source, Direction, SampleSource};
use bounce_midi::{MidiEventList, MidiFileSource, MidiSequence};
use bounce_plugin::PluginChain;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const PROGRAM_NAME: &str = "bounce";

/// Everything a run needs, resolved from the command line (or built by
/// hand in tests). `None` settings fall back to the defaults.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    pub sample_rate: Option<f64>,
    pub blocksize: Option<usize>,
    pub channels: Option<usize>,
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub midi_file: Option<PathBuf>,
    pub plugins: Vec<String>,
    pub display_info: bool,
}

/// Counters reported after a completed run.
#[derive(Debug, Clone)]
pub struct RenderStats {
    pub frames_read: u64,
    pub frames_written: u64,
    /// Final transport position: iterations times blocksize.
    pub final_sample: u64,
    pub blocks: u64,
    pub processing_time: Duration,
}

pub struct Engine {
    settings: AudioSettings,
    clock: AudioClock,
    chain: PluginChain,
    input: Box<dyn SampleSource>,
    output: Box<dyn SampleSource>,
    midi: Option<MidiSequence>,
}

/// Validate a run configuration and assemble the engine.
///
/// Check order mirrors the CLI contract: plugins resolve and initialize
/// first (so "No plugins loaded" wins over missing sources), then the
/// output, then the input, synthesizing a silence source when an
/// instrument heads the chain, which additionally requires MIDI.
pub fn prepare(config: &RunConfig) -> Result<Engine> {
    let mut settings = AudioSettings::default();
    if let Some(sample_rate) = config.sample_rate {
        settings.sample_rate = sample_rate;
    }
    if let Some(blocksize) = config.blocksize {
        settings.blocksize = blocksize;
    }
    if let Some(channels) = config.channels {
        settings.channels = channels;
    }
    settings.validate()?;

    let mut chain = PluginChain::new();
    for argument in &config.plugins {
        chain.add_from_argument_string(argument)?;
    }
    if chain.is_empty() {
        return Err(Error::MissingRequiredOption("No plugins loaded"));
    }
    chain.initialize_all(&settings)?;
    if config.display_info {
        chain.display_info();
    }

    let Some(output_path) = &config.output else {
        return Err(Error::MissingRequiredOption("No output source"));
    };

    // MIDI loads before input selection: an instrument-headed chain without
    // an input file is only valid when a sequence exists to end the loop.
    let midi = match &config.midi_file {
        Some(path) => {
            let source = MidiFileSource::open(path)?;
            let sequence = source.read_all_events(settings.sample_rate)?;
            info!(
                "Loaded {} MIDI events from '{}'",
                sequence.len(),
                source.name()
            );
            Some(sequence)
        }
        None => None,
    };

    let input: Box<dyn SampleSource> = match &config.input {
        Some(path) => open_sample_source(path, Direction::Read, &settings)?,
        None if chain.head_is_instrument() => {
            if midi.is_none() {
                return Err(Error::MissingRequiredOption(
                    "Plugin chain contains an instrument, but no MIDI source was supplied",
                ));
            }
            debug!("No input source given; feeding the instrument chain silence");
            silence_source()
        }
        None => return Err(Error::MissingRequiredOption("No input source")),
    };

    // An empty sequence alongside a real input is just "no events". With the
    // silence source it must stay: only the sequence can end that loop.
    let midi = match midi {
        Some(sequence) if sequence.is_empty() && config.input.is_some() => {
            warn!("MIDI file contains no events; the run is driven by audio end-of-stream alone");
            None
        }
        other => other,
    };

    let output = open_sample_source(output_path, Direction::Write, &settings)?;

    Engine::new(settings, chain, input, output, midi)
}

impl Engine {
    /// Assemble an engine from ready components. The chain must be
    /// non-empty and already initialized against `settings`.
    pub fn new(
        settings: AudioSettings,
        chain: PluginChain,
        input: Box<dyn SampleSource>,
        output: Box<dyn SampleSource>,
        midi: Option<MidiSequence>,
    ) -> Result<Self> {
        if chain.is_empty() {
            return Err(Error::MissingRequiredOption("No plugins loaded"));
        }
        settings.validate()?;
        Ok(Self {
            settings,
            clock: AudioClock::new(),
            chain,
            input,
            output,
            midi,
        })
    }

    /// Run the main loop to completion, then report timing and frame
    /// counters and release every resource. Teardown runs the same way on
    /// the error paths; a partial output file is left as-is.
    pub fn run(mut self) -> Result<RenderStats> {
        let blocksize = self.settings.blocksize;
        info!(
            "Processing with sample rate {:.0}, blocksize {}, {} channels",
            self.settings.sample_rate, blocksize, self.settings.channels
        );

        let mut input_buffer = SampleBuffer::new(self.settings.channels, blocksize);
        let mut output_buffer = SampleBuffer::new(self.settings.channels, blocksize);
        let num_plugins = self.chain.len();
        let mut timer = TaskTimer::new(num_plugins + 1);
        let host_task = num_plugins;
        let mut block_events = MidiEventList::new();

        let mut finished = false;
        let mut run_error: Option<Error> = None;

        while !finished {
            timer.start(host_task);

            let audio_more = match self.input.read_block(&mut input_buffer) {
                Ok(more) => more,
                Err(e) => {
                    error!("Reading from '{}' failed: {}", self.input.name(), e);
                    run_error = Some(e.into());
                    break;
                }
            };
            finished = !audio_more;

            if let Some(sequence) = &self.midi {
                block_events.clear();
                let midi_more = sequence.fill_range(
                    self.clock.current_sample(),
                    blocksize,
                    &mut block_events,
                );
                if midi_more != audio_more {
                    debug!(
                        "MIDI end-of-sequence overrides audio end-of-stream at sample {} \
                         (midi continues: {}, audio continues: {})",
                        self.clock.current_sample(),
                        midi_more,
                        audio_more
                    );
                }
                finished = !midi_more;
                self.chain.process_midi_events(&block_events, &mut timer);
                timer.start(host_task);
            }

            self.chain
                .process_audio(&input_buffer, &mut output_buffer, &mut timer);
            timer.start(host_task);

            if let Err(e) = self.output.write_block(&output_buffer) {
                error!("Writing to '{}' failed: {}", self.output.name(), e);
                run_error = Some(e.into());
                break;
            }

            self.clock.advance(blocksize as u64);
        }

        self.clock.stop();
        timer.stop();

        let total = timer.total_all();
        info!(
            "Total processing time {}ms, approximate breakdown by component:",
            total.as_millis()
        );
        for index in 0..num_plugins {
            info!(
                "  {}: {}ms ({:.1}%)",
                self.chain.name_of(index),
                timer.total(index).as_millis(),
                percentage(timer.total(index), total)
            );
        }
        info!(
            "  {}: {}ms ({:.1}%)",
            PROGRAM_NAME,
            timer.total(host_task).as_millis(),
            percentage(timer.total(host_task), total)
        );
        info!(
            "Read {} frames from {}, wrote {} frames to {}",
            self.input.frames_processed(),
            self.input.name(),
            self.output.frames_processed(),
            self.output.name()
        );

        debug!("Shutting down");
        self.chain.close_all();
        if let Err(e) = self.input.close() {
            warn!("Closing '{}' failed: {}", self.input.name(), e);
        }
        if let Err(e) = self.output.close() {
            error!("Closing '{}' failed: {}", self.output.name(), e);
            if run_error.is_none() {
                run_error = Some(e.into());
            }
        }

        if let Some(error) = run_error {
            return Err(error);
        }
        Ok(RenderStats {
            frames_read: self.input.frames_processed(),
            frames_written: self.output.frames_processed(),
            final_sample: self.clock.current_sample(),
            blocks: self.clock.current_sample() / blocksize as u64,
            processing_time: total,
        })
    }
}

fn percentage(part: Duration, total: Duration) -> f64 {
    if total.is_zero() {
        0.0
    } else {
        part.as_secs_f64() / total.as_secs_f64() * 100.0
    }
}
