//! Playback orchestrator
//!
//! Drives a [`Sequence`] through a [`PlayerBackend`]. Backends that can
//! play waveforms get the whole piece as one crossfaded WAV file; tone-only
//! backends (or a config that asks for it) get one step per event.
//!
//! Playback problems are never fatal: a failed step is logged and replayed
//! on the fallback backend, the terminal bell by default.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use crate::pipeline::assembler::{assemble, AssemblerConfig};
use crate::player::{
    BeepMethod, BeepPlayer, Capability, PlaybackError, PlayerBackend, Sound, TempWav,
};
use crate::sequence::{Event, Pitch, Sequence, Voice};
use crate::synth::{synthesize, DEFAULT_SAMPLE_RATE};

/// How a sequence is handed to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Render everything into one buffer and play it once
    WholeSequence,
    /// Synthesize and play each event, pausing briefly in between
    PerEvent,
}

/// Where the orchestrator is in a playback run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Rendering,
    Encoding,
    HandedOffToPlayer,
    PlayingNote,
    Waiting,
}

/// Configuration for playback
#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Envelope and crossfade settings
    pub assembler: AssemblerConfig,
    /// Pause after each event in per-event mode
    pub inter_note_gap: Duration,
    /// Preferred strategy; tone-only backends always run per event
    pub strategy: Strategy,
    /// Directory for temporary WAV files
    pub temp_dir: PathBuf,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            assembler: AssemblerConfig::default(),
            inter_note_gap: Duration::from_millis(5),
            strategy: Strategy::WholeSequence,
            temp_dir: std::env::temp_dir(),
        }
    }
}

/// Plays sequences on one backend
pub struct Orchestrator {
    backend: Box<dyn PlayerBackend>,
    fallback: Box<dyn PlayerBackend>,
    config: PlaybackConfig,
    state: PlaybackState,
}

impl Orchestrator {
    /// Create an orchestrator that falls back to the terminal bell
    pub fn new(backend: Box<dyn PlayerBackend>, config: PlaybackConfig) -> Self {
        Self {
            backend,
            fallback: Box::new(BeepPlayer::new(BeepMethod::TerminalBell)),
            config,
            state: PlaybackState::Idle,
        }
    }

    /// Replace the backend used when a step fails
    pub fn with_fallback(mut self, fallback: Box<dyn PlayerBackend>) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// The strategy `play` will use with the current backend
    pub fn strategy(&self) -> Strategy {
        match (self.config.strategy, self.backend.capability()) {
            (Strategy::WholeSequence, Capability::Waveform) => Strategy::WholeSequence,
            _ => Strategy::PerEvent,
        }
    }

    fn set_state(&mut self, state: PlaybackState) {
        if self.state != state {
            log::trace!("playback state {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    /// Play a sequence to the end
    ///
    /// Blocks until the last event has finished. Events never overlap:
    /// event N+1 starts only after every hand of event N is done.
    pub fn play(&mut self, sequence: &Sequence) {
        let strategy = self.strategy();
        log::debug!(
            "playing {} events ({:.2}s) on {} using {:?}",
            sequence.len(),
            sequence.total_duration(),
            self.backend.name(),
            strategy
        );

        match strategy {
            Strategy::WholeSequence => {
                if let Err(e) = self.play_whole(sequence) {
                    log::warn!(
                        "{} failed: {}; falling back to {}",
                        self.backend.name(),
                        e,
                        self.fallback.name()
                    );
                    self.play_per_event(sequence, true);
                }
            }
            Strategy::PerEvent => self.play_per_event(sequence, false),
        }

        self.set_state(PlaybackState::Idle);
    }

    fn play_whole(&mut self, sequence: &Sequence) -> Result<(), PlaybackError> {
        self.set_state(PlaybackState::Rendering);
        let buffer = assemble(sequence, self.config.sample_rate, &self.config.assembler);
        let seconds = buffer.duration();
        log::debug!("rendered {} samples ({:.2}s)", buffer.len(), seconds);

        self.set_state(PlaybackState::Encoding);
        let wav = TempWav::create(&self.config.temp_dir, "full", &buffer)?;

        self.set_state(PlaybackState::HandedOffToPlayer);
        self.backend.play(Sound::Wav(wav.path()))
    }

    fn play_per_event(&mut self, sequence: &Sequence, fallback_only: bool) {
        for (index, event) in sequence.iter().enumerate() {
            self.set_state(PlaybackState::PlayingNote);
            log::trace!("event {}: {:.3}s", index, event.duration());

            let step = Step {
                backend: if fallback_only {
                    self.fallback.as_ref()
                } else {
                    self.backend.as_ref()
                },
                fallback: self.fallback.as_ref(),
                config: &self.config,
            };
            step.play_event(event);

            self.set_state(PlaybackState::Waiting);
            thread::sleep(self.config.inter_note_gap);
        }
    }
}

/// Borrowed context for one per-event step, shared by both hands
#[derive(Clone, Copy)]
struct Step<'a> {
    backend: &'a dyn PlayerBackend,
    fallback: &'a dyn PlayerBackend,
    config: &'a PlaybackConfig,
}

impl Step<'_> {
    fn play_event(&self, event: &Event) {
        match event {
            Event::Single(voice) => self.play_voice(voice),
            Event::TwoHand { left, right } => thread::scope(|s| {
                let handle = s.spawn(|| self.play_voice(left));
                self.play_voice(right);
                if handle.join().is_err() {
                    log::warn!("left hand panicked");
                }
            }),
        }
    }

    fn play_voice(&self, voice: &Voice) {
        let duration = Duration::from_secs_f64(voice.duration());
        let Some(frequency) = voice.pitch().representative_frequency() else {
            thread::sleep(duration);
            return;
        };

        let result = match self.backend.capability() {
            Capability::Waveform => self.play_rendered(voice),
            Capability::ToneOnly => {
                if let Pitch::Chord(chord) = voice.pitch() {
                    log::debug!(
                        "{} plays one tone; chord of {} reduced to {:.2} Hz",
                        self.backend.name(),
                        chord.frequencies().len(),
                        frequency
                    );
                }
                self.backend.play(Sound::Tone {
                    frequency,
                    duration,
                })
            }
        };

        if let Err(e) = result {
            log::warn!(
                "{} failed: {}; falling back to {}",
                self.backend.name(),
                e,
                self.fallback.name()
            );
            let tone = Sound::Tone {
                frequency,
                duration,
            };
            if let Err(e) = self.fallback.play(tone) {
                log::warn!("{} failed too: {}", self.fallback.name(), e);
            }
        }
    }

    fn play_rendered(&self, voice: &Voice) -> Result<(), PlaybackError> {
        let buffer = synthesize(
            voice.pitch(),
            voice.duration(),
            self.config.sample_rate,
            &self.config.assembler.envelope,
        );
        let wav = TempWav::create(&self.config.temp_dir, "note", &buffer)?;
        self.backend.play(Sound::Wav(wav.path()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wav::WavHeader;
    use std::fs;
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use std::time::Instant;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        /// Sample count of the WAV and where it lived
        Wav(usize, PathBuf),
        Tone(f64, Duration),
    }

    type Calls = Arc<Mutex<Vec<Call>>>;

    struct MockBackend {
        name: &'static str,
        capability: Capability,
        fail: bool,
        calls: Calls,
    }

    impl MockBackend {
        fn boxed(name: &'static str, capability: Capability, fail: bool) -> (Box<Self>, Calls) {
            let calls = Calls::default();
            let mock = Box::new(Self {
                name,
                capability,
                fail,
                calls: Arc::clone(&calls),
            });
            (mock, calls)
        }
    }

    impl PlayerBackend for MockBackend {
        fn name(&self) -> &str {
            self.name
        }

        fn capability(&self) -> Capability {
            self.capability
        }

        fn play(&self, sound: Sound<'_>) -> Result<(), PlaybackError> {
            let call = match sound {
                Sound::Wav(path) => {
                    let bytes = fs::read(path)?;
                    let (header, _) = WavHeader::parse(&bytes).unwrap();
                    Call::Wav(header.sample_count(), path.to_path_buf())
                }
                Sound::Tone {
                    frequency,
                    duration,
                } => Call::Tone(frequency, duration),
            };
            self.calls.lock().unwrap().push(call);

            if self.fail {
                Err(PlaybackError::PlayerFailed {
                    program: self.name.to_string(),
                    status: "exit status: 1".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    fn quick_config() -> PlaybackConfig {
        PlaybackConfig {
            inter_note_gap: Duration::ZERO,
            ..Default::default()
        }
    }

    fn voice(pitch: Pitch, duration: f64) -> Voice {
        Voice::new(pitch, duration).unwrap()
    }

    fn tones(calls: &Calls) -> Vec<f64> {
        calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                Call::Tone(f, _) => Some(*f),
                Call::Wav(..) => None,
            })
            .collect()
    }

    #[test]
    fn test_default_config() {
        let config = PlaybackConfig::default();
        assert_eq!(config.sample_rate, 44100);
        assert_eq!(config.inter_note_gap, Duration::from_millis(5));
        assert_eq!(config.strategy, Strategy::WholeSequence);
        assert_eq!(config.assembler.crossfade_samples(44100), 441);
    }

    #[test]
    fn test_strategy_follows_capability() {
        let (wave, _) = MockBackend::boxed("wave", Capability::Waveform, false);
        let orch = Orchestrator::new(wave, quick_config());
        assert_eq!(orch.strategy(), Strategy::WholeSequence);

        let (tone, _) = MockBackend::boxed("tone", Capability::ToneOnly, false);
        let orch = Orchestrator::new(tone, quick_config());
        assert_eq!(orch.strategy(), Strategy::PerEvent);

        let (wave, _) = MockBackend::boxed("wave", Capability::Waveform, false);
        let config = PlaybackConfig {
            strategy: Strategy::PerEvent,
            ..quick_config()
        };
        let orch = Orchestrator::new(wave, config);
        assert_eq!(orch.strategy(), Strategy::PerEvent);
        assert_eq!(orch.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_whole_sequence_single_file() {
        let (wave, calls) = MockBackend::boxed("wave", Capability::Waveform, false);
        let mut orch = Orchestrator::new(wave, quick_config());

        let seq = Sequence::new(vec![
            Event::note(392.00, 0.3).unwrap(),
            Event::note(329.63, 0.3).unwrap(),
        ]);
        orch.play(&seq);

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let Call::Wav(samples, path) = &calls[0] else {
            panic!("expected a WAV call, got {:?}", calls[0]);
        };
        assert_eq!(*samples, 2 * 13230 - 441);
        assert!(!path.exists(), "temp file left behind");
        assert_eq!(orch.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_per_event_on_tone_only_backend() {
        let (tone, calls) = MockBackend::boxed("tone", Capability::ToneOnly, false);
        let mut orch = Orchestrator::new(tone, quick_config());

        let seq = Sequence::new(vec![
            Event::note(440.0, 0.01).unwrap(),
            Event::rest(0.01).unwrap(),
            Event::chord(&[293.66, 196.0, 587.33], 0.02).unwrap(),
        ]);
        orch.play(&seq);

        let calls = calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![
                Call::Tone(440.0, Duration::from_secs_f64(0.01)),
                Call::Tone(196.0, Duration::from_secs_f64(0.02)),
            ]
        );
    }

    #[test]
    fn test_two_hand_event_plays_both_before_next() {
        let (tone, calls) = MockBackend::boxed("tone", Capability::ToneOnly, false);
        let mut orch = Orchestrator::new(tone, quick_config());

        let seq = Sequence::new(vec![
            Event::two_hand(
                voice(Pitch::Tone(130.81), 0.01),
                voice(Pitch::chord(&[523.25, 659.25]).unwrap(), 0.02),
            ),
            Event::note(880.0, 0.01).unwrap(),
        ]);
        orch.play(&seq);

        let played = tones(&calls);
        assert_eq!(played.len(), 3);
        let mut hands = played[..2].to_vec();
        hands.sort_by(f64::total_cmp);
        assert_eq!(hands, vec![130.81, 523.25]);
        assert_eq!(played[2], 880.0);
    }

    /// Sounds each tone for its full length and records when it ran
    struct TimedBackend {
        spans: Arc<Mutex<Vec<(f64, Instant, Instant)>>>,
    }

    impl PlayerBackend for TimedBackend {
        fn name(&self) -> &str {
            "timed"
        }

        fn capability(&self) -> Capability {
            Capability::ToneOnly
        }

        fn play(&self, sound: Sound<'_>) -> Result<(), PlaybackError> {
            if let Sound::Tone {
                frequency,
                duration,
            } = sound
            {
                let start = Instant::now();
                thread::sleep(duration);
                let span = (frequency, start, Instant::now());
                self.spans.lock().unwrap().push(span);
            }
            Ok(())
        }
    }

    #[test]
    fn test_two_hands_sound_together() {
        let spans = Arc::new(Mutex::new(Vec::new()));
        let backend = Box::new(TimedBackend {
            spans: Arc::clone(&spans),
        });
        let mut orch = Orchestrator::new(backend, quick_config());

        let seq = Sequence::new(vec![
            Event::two_hand(
                voice(Pitch::Tone(130.81), 0.1),
                voice(Pitch::chord(&[523.25, 659.25]).unwrap(), 0.1),
            ),
            Event::note(880.0, 0.01).unwrap(),
        ]);
        orch.play(&seq);

        let spans = spans.lock().unwrap();
        assert_eq!(spans.len(), 3);
        let (hands, next): (Vec<&(f64, Instant, Instant)>, Vec<_>) = spans.iter().partition(|s| s.0 != 880.0);
        assert_eq!(hands.len(), 2);

        let step_start = hands[0].1.min(hands[1].1);
        let step_end = hands[0].2.max(hands[1].2);
        // Played one after the other the step would take 200ms
        let step = step_end - step_start;
        assert!(step < Duration::from_millis(180), "took {:?}", step);

        // The next event waits for both hands
        assert!(next[0].1 >= step_end);
    }

    #[test]
    fn test_per_event_waveform_files() {
        let (wave, calls) = MockBackend::boxed("wave", Capability::Waveform, false);
        let config = PlaybackConfig {
            strategy: Strategy::PerEvent,
            ..quick_config()
        };
        let mut orch = Orchestrator::new(wave, config);

        let seq = Sequence::new(vec![
            Event::note(440.0, 0.01).unwrap(),
            Event::rest(0.01).unwrap(),
            Event::chord(&[261.63, 329.63], 0.02).unwrap(),
        ]);
        orch.play(&seq);

        let calls = calls.lock().unwrap();
        let lengths: Vec<usize> = calls
            .iter()
            .map(|c| match c {
                Call::Wav(n, path) => {
                    assert!(!Path::new(path).exists());
                    *n
                }
                Call::Tone(..) => panic!("unexpected tone"),
            })
            .collect();
        assert_eq!(lengths, vec![441, 882]);
    }

    #[test]
    fn test_failed_whole_sequence_falls_back_per_event() {
        let (wave, wave_calls) = MockBackend::boxed("broken", Capability::Waveform, true);
        let (bell, bell_calls) = MockBackend::boxed("bell", Capability::ToneOnly, false);
        let mut orch = Orchestrator::new(wave, quick_config()).with_fallback(bell);

        let seq = Sequence::new(vec![
            Event::note(440.0, 0.01).unwrap(),
            Event::rest(0.01).unwrap(),
            Event::chord(&[392.0, 196.0], 0.01).unwrap(),
        ]);
        orch.play(&seq);

        assert_eq!(wave_calls.lock().unwrap().len(), 1);
        assert_eq!(tones(&bell_calls), vec![440.0, 196.0]);
        assert_eq!(orch.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_failed_tone_falls_back() {
        let (tone, tone_calls) = MockBackend::boxed("broken", Capability::ToneOnly, true);
        let (bell, bell_calls) = MockBackend::boxed("bell", Capability::ToneOnly, false);
        let mut orch = Orchestrator::new(tone, quick_config()).with_fallback(bell);

        let seq = Sequence::new(vec![
            Event::note(440.0, 0.01).unwrap(),
            Event::note(220.0, 0.01).unwrap(),
        ]);
        orch.play(&seq);

        assert_eq!(tones(&tone_calls), vec![440.0, 220.0]);
        assert_eq!(tones(&bell_calls), vec![440.0, 220.0]);
    }

    #[test]
    fn test_unwritable_temp_dir_falls_back() {
        let (wave, wave_calls) = MockBackend::boxed("wave", Capability::Waveform, false);
        let (bell, bell_calls) = MockBackend::boxed("bell", Capability::ToneOnly, false);
        let config = PlaybackConfig {
            temp_dir: std::env::temp_dir().join("nananana-missing").join("dir"),
            ..quick_config()
        };
        let mut orch = Orchestrator::new(wave, config).with_fallback(bell);

        orch.play(&Sequence::new(vec![Event::note(440.0, 0.01).unwrap()]));

        assert!(wave_calls.lock().unwrap().is_empty());
        assert_eq!(tones(&bell_calls), vec![440.0]);
    }

    #[test]
    fn test_empty_sequence() {
        let (tone, calls) = MockBackend::boxed("tone", Capability::ToneOnly, false);
        let mut orch = Orchestrator::new(tone, quick_config());
        orch.play(&Sequence::default());
        assert!(calls.lock().unwrap().is_empty());
        assert_eq!(orch.state(), PlaybackState::Idle);
    }
}
