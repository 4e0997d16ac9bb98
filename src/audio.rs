//! Audio system using Web Audio API
//!
//! Procedurally generated sound effects and a looping background drone - no
//! external files needed!

use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

use crate::settings::Settings;
use crate::sim::{GameEvent, PLAYER_ID};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Cannon shot
    Fire,
    /// Shell strikes an enemy hull
    Hit,
    /// Shell strikes the player
    PlayerHit,
    /// Enemy removed from the arena
    EnemyDestroyed,
    /// New wave rolls in
    WaveStart,
    /// Player destroyed
    GameOver,
}

impl SoundEffect {
    /// Sound for a simulation event
    pub fn for_event(event: &GameEvent) -> Self {
        match event {
            GameEvent::ShotFired { .. } => SoundEffect::Fire,
            GameEvent::VehicleHit { vehicle, .. } if *vehicle == PLAYER_ID => {
                SoundEffect::PlayerHit
            }
            GameEvent::VehicleHit { .. } => SoundEffect::Hit,
            GameEvent::EnemyDestroyed { .. } => SoundEffect::EnemyDestroyed,
            GameEvent::WaveSpawned { .. } => SoundEffect::WaveStart,
            GameEvent::PlayerDestroyed => SoundEffect::GameOver,
        }
    }
}

/// Background voices: frequency and waveform
const MUSIC_VOICES: [(f32, OscillatorType); 3] = [
    (55.0, OscillatorType::Sine),
    (82.5, OscillatorType::Sine),
    (110.6, OscillatorType::Triangle),
];
/// Slow swell applied to the background gain
const MUSIC_SWELL_HZ: f32 = 0.125;

/// Oscillators that run until stopped, mixed through one gain node
struct BackgroundLoop {
    voices: Vec<OscillatorNode>,
    swell: Option<GainNode>,
    gain: GainNode,
}

/// Audio manager for the game
pub struct AudioManager {
    ctx: Option<AudioContext>,
    master_volume: f32,
    sfx_volume: f32,
    music_volume: f32,
    muted: bool,
    music: Option<BackgroundLoop>,
}

impl AudioManager {
    pub fn new(settings: &Settings) -> Self {
        // May fail outside a secure context
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        Self {
            ctx,
            master_volume: settings.master_volume,
            sfx_volume: settings.sfx_volume,
            music_volume: settings.music_volume,
            muted: settings.muted,
            music: None,
        }
    }

    /// Resume audio context (required after user gesture)
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            let _ = ctx.resume();
        }
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        let level = self.music_level();
        if let Some(music) = &self.music {
            music.gain.gain().set_value(level);
            if let Some(swell) = &music.swell {
                swell.gain().set_value(level * 0.5);
            }
        }
    }

    fn music_level(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.music_volume * 0.2
        }
    }

    /// Start the background loop. Does nothing if it is already playing.
    pub fn start_music(&mut self) {
        if self.music.is_some() {
            return;
        }
        let Some(ctx) = &self.ctx else { return };
        let Ok(gain) = ctx.create_gain() else { return };
        if gain.connect_with_audio_node(&ctx.destination()).is_err() {
            return;
        }
        let level = self.music_level();
        gain.gain().set_value(level);

        let mut voices = Vec::with_capacity(MUSIC_VOICES.len() + 1);
        for (freq, osc_type) in MUSIC_VOICES {
            let Ok(osc) = ctx.create_oscillator() else {
                continue;
            };
            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            if osc.connect_with_audio_node(&gain).is_ok() && osc.start().is_ok() {
                voices.push(osc);
            }
        }

        // Low-frequency oscillator pulsing the mix gain
        let swell = ctx.create_oscillator().ok().and_then(|lfo| {
            let depth = ctx.create_gain().ok()?;
            lfo.frequency().set_value(MUSIC_SWELL_HZ);
            depth.gain().set_value(level * 0.5);
            lfo.connect_with_audio_node(&depth).ok()?;
            depth.connect_with_audio_param(&gain.gain()).ok()?;
            lfo.start().ok()?;
            voices.push(lfo);
            Some(depth)
        });

        log::info!("Background loop started with {} voices", voices.len());
        self.music = Some(BackgroundLoop {
            voices,
            swell,
            gain,
        });
    }

    /// Stop the background loop
    pub fn stop_music(&mut self) {
        let Some(music) = self.music.take() else {
            return;
        };
        for voice in &music.voices {
            let _ = voice.stop();
        }
        let _ = music.gain.disconnect();
    }

    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    pub fn play_event(&mut self, event: &GameEvent) {
        let effect = SoundEffect::for_event(event);
        if effect == SoundEffect::GameOver {
            self.stop_music();
        }
        self.play(effect);
    }

    /// Play a sound effect
    pub fn play(&self, effect: SoundEffect) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }

        let Some(ctx) = &self.ctx else { return };

        // Browsers keep the context suspended until a user gesture
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        match effect {
            SoundEffect::Fire => self.play_fire(ctx, vol),
            SoundEffect::Hit => self.play_hit(ctx, vol, 520.0),
            SoundEffect::PlayerHit => self.play_hit(ctx, vol, 260.0),
            SoundEffect::EnemyDestroyed => self.play_explosion(ctx, vol),
            SoundEffect::WaveStart => self.play_wave_start(ctx, vol),
            SoundEffect::GameOver => self.play_game_over(ctx, vol),
        }
    }

    // === Sound generators ===

    /// Create an oscillator with gain envelope
    fn create_osc(
        &self,
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }

    /// Decaying tone that sweeps from `from` to `to` Hz
    #[allow(clippy::too_many_arguments)]
    fn sweep(
        &self,
        ctx: &AudioContext,
        osc_type: OscillatorType,
        from: f32,
        to: f32,
        peak: f32,
        start: f64,
        length: f64,
    ) {
        let Some((osc, gain)) = self.create_osc(ctx, from, osc_type) else {
            return;
        };
        gain.gain().set_value_at_time(peak, start).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, start + length)
            .ok();
        osc.frequency().set_value_at_time(from, start).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(to, start + length)
            .ok();
        osc.start_with_when(start).ok();
        osc.stop_with_when(start + length + 0.02).ok();
    }

    /// Cannon - low boom with a short crack on top
    fn play_fire(&self, ctx: &AudioContext, vol: f32) {
        let t = ctx.current_time();
        self.sweep(ctx, OscillatorType::Sine, 120.0, 40.0, vol * 0.5, t, 0.18);
        self.sweep(ctx, OscillatorType::Sawtooth, 900.0, 150.0, vol * 0.15, t, 0.06);
    }

    /// Metallic clang at `pitch`
    fn play_hit(&self, ctx: &AudioContext, vol: f32, pitch: f32) {
        let t = ctx.current_time();
        self.sweep(ctx, OscillatorType::Square, pitch, pitch * 0.6, vol * 0.25, t, 0.12);
        self.sweep(ctx, OscillatorType::Triangle, pitch * 2.4, pitch * 2.0, vol * 0.12, t, 0.2);
    }

    /// Explosion - layered rumble
    fn play_explosion(&self, ctx: &AudioContext, vol: f32) {
        let t = ctx.current_time();
        self.sweep(ctx, OscillatorType::Sine, 90.0, 30.0, vol * 0.6, t, 0.5);
        self.sweep(ctx, OscillatorType::Sawtooth, 300.0, 50.0, vol * 0.3, t, 0.35);
        self.sweep(ctx, OscillatorType::Square, 1800.0, 200.0, vol * 0.08, t, 0.15);
    }

    /// Wave start - three rising notes
    fn play_wave_start(&self, ctx: &AudioContext, vol: f32) {
        let t = ctx.current_time();
        for (i, freq) in [330.0, 440.0, 660.0].into_iter().enumerate() {
            let start = t + i as f64 * 0.12;
            self.sweep(ctx, OscillatorType::Triangle, freq, freq, vol * 0.25, start, 0.15);
        }
    }

    /// Game over - slow descending tones
    fn play_game_over(&self, ctx: &AudioContext, vol: f32) {
        let t = ctx.current_time();
        for (i, freq) in [392.0, 330.0, 262.0, 196.0].into_iter().enumerate() {
            let start = t + i as f64 * 0.25;
            self.sweep(ctx, OscillatorType::Sine, freq, freq * 0.9, vol * 0.35, start, 0.3);
        }
    }
}
