//! The main loop.
//!
//! Each tick polls the host channel, checks the layer button, runs all nine keys through
//! debounce, repeat and action dispatch, then decides whether the display needs a new frame.

use embassy_time::{Duration, Instant, Timer};
use embedded_hal::digital::InputPin;
use trkey_common::{globals::Timing, KEY_COUNT};

use crate::{
    action::{resolve, resolve_macro_body, resolve_step, Action, MacroStep, MouseAction},
    config::{load_layers, ConfigError, MAX_FILE_LEN},
    control::{ControlChannel, ControlConfig, ControlTarget, HostPort},
    debug,
    display::{Frame, FrameSignal},
    fs::FileStore,
    hid::{OutputError, ReportWriter},
    info,
    key_reporter::Reporter,
    key_scanner::{KeyEdge, KeyScanner, LayerButton},
    layers::{LayerSet, LayerState, MacroBody},
    now_playing::NowPlaying,
    warn,
};

/// The hardware the engine drives.
pub struct Peripherals<K: InputPin, B: InputPin, W: ReportWriter, P: HostPort> {
    pub keys: [K; KEY_COUNT],
    pub layer_button: B,
    pub hid: W,
    pub host: P,
}

/// Key map, layer state and now-playing record; everything the host channel can change.
pub struct PadState {
    layers: LayerSet,
    state: LayerState,
    now_playing: NowPlaying,
    refresh: bool,
    json_buf: [u8; MAX_FILE_LEN],
}

impl Default for PadState {
    fn default() -> Self {
        Self {
            layers: LayerSet::fallback(),
            state: LayerState::default(),
            now_playing: NowPlaying::default(),
            refresh: true,
            json_buf: [0; MAX_FILE_LEN],
        }
    }
}

impl PadState {
    pub fn layers(&self) -> &LayerSet {
        &self.layers
    }

    pub fn layer_state(&self) -> &LayerState {
        &self.state
    }

    pub fn now_playing_record(&self) -> &NowPlaying {
        &self.now_playing
    }
}

impl ControlTarget for PadState {
    fn reload_layers(&mut self, fs: &dyn FileStore) -> Result<(), ConfigError> {
        match load_layers(fs, &mut self.json_buf) {
            Ok(layers) => {
                self.state.clamp_to(layers.len());
                self.layers = layers;
                Ok(())
            }
            Err(err) => {
                warn!("layers not loaded: {:?}", err);
                self.layers = LayerSet::fallback();
                self.state.reset();
                Err(err)
            }
        }
    }

    fn now_playing(&mut self) -> &mut NowPlaying {
        &mut self.now_playing
    }

    fn request_refresh(&mut self) {
        self.refresh = true;
    }
}

pub struct Engine<'a, K: InputPin, B: InputPin, W: ReportWriter, P: HostPort> {
    fs: &'a dyn FileStore,
    frames: &'a FrameSignal,
    timing: Timing,
    keys: KeyScanner<K>,
    layer_button: LayerButton<B>,
    layer_button_ready: Instant,
    reporter: Reporter<W>,
    control: ControlChannel<P>,
    pad: PadState,
    /// Key highlighted on the display and when it was pressed.
    pressed: Option<(usize, Instant)>,
}

impl<'a, K: InputPin, B: InputPin, W: ReportWriter, P: HostPort> Engine<'a, K, B, W, P> {
    pub fn new(
        fs: &'a dyn FileStore,
        frames: &'a FrameSignal,
        peripherals: Peripherals<K, B, W, P>,
        timing: Timing,
        control: ControlConfig,
    ) -> Self {
        Self {
            fs,
            frames,
            timing,
            keys: KeyScanner::new(peripherals.keys, &timing),
            layer_button: LayerButton::new(peripherals.layer_button),
            layer_button_ready: Instant::MIN,
            reporter: Reporter::new(peripherals.hid),
            control: ControlChannel::new(peripherals.host, control),
            pad: PadState::default(),
            pressed: None,
        }
    }

    pub fn pad(&self) -> &PadState {
        &self.pad
    }

    pub fn control(&self) -> &ControlChannel<P> {
        &self.control
    }

    pub fn reporter(&self) -> &Reporter<W> {
        &self.reporter
    }

    /// Load `layers.json`, falling back to the error layer, and queue the first frame.
    pub fn start(&mut self) {
        if self.pad.reload_layers(self.fs).is_ok() {
            info!("started with {} layers", self.pad.layers.len());
        }
        self.pad.refresh = true;
    }

    pub async fn run(&mut self) -> ! {
        self.start();
        let tick = ms(self.timing.tick_ms);
        loop {
            self.tick(Instant::now()).await;
            Timer::after(tick).await;
        }
    }

    pub async fn tick(&mut self, now: Instant) {
        self.control.poll(self.fs, &mut self.pad, now).await;

        if now >= self.layer_button_ready && self.layer_button.poll() {
            self.pad.state.cycle(self.pad.layers.len());
            self.pad.refresh = true;
            self.layer_button_ready = now + ms(self.timing.layer_button_settle_ms);
            debug!("layer button: layer {}", self.pad.state.current());
        }

        for key in 0..KEY_COUNT {
            let exempt = self.pad.state.is_momentary(key);
            if let Some(edge) = self.keys.poll_key(key, now, exempt) {
                self.key_edge(key, edge, now).await;
            }
        }

        self.update_display(now);
    }

    async fn key_edge(&mut self, key: usize, edge: KeyEdge, now: Instant) {
        let len = self.pad.layers.len();
        if edge == KeyEdge::Release {
            if self.pad.state.release(key, len) {
                self.pad.refresh = true;
            }
            return;
        }

        self.pressed = Some((key, now));
        self.pad.refresh = true;

        let token = self.pad.layers.layer(self.pad.state.current()).keys[key].clone();
        let action = match resolve(&token, self.pad.layers.macros()) {
            Ok(action) => action,
            Err(err) => {
                warn!("key {} {}: {:?}", key, token.as_str(), err);
                return;
            }
        };

        if let Err(err) = self.dispatch(action, key, edge).await {
            warn!("key {} output failed: {:?}", key, err);
        }
    }

    async fn dispatch(
        &mut self,
        action: Action<'_>,
        key: usize,
        edge: KeyEdge,
    ) -> Result<(), OutputError> {
        let hold = ms(self.timing.key_hold_ms);
        match action {
            Action::NoOp => Ok(()),
            Action::LayerFn { kind, target } => {
                if self
                    .pad
                    .state
                    .apply(kind, target, key, edge, self.pad.layers.len())
                {
                    self.pad.refresh = true;
                }
                Ok(())
            }
            Action::MacroRef(id) => {
                let Some(body) = self.pad.layers.macros().get(id) else {
                    return Ok(());
                };
                if let MacroBody::Sequence(sequence) = body {
                    return match resolve_macro_body(sequence) {
                        Ok(action) => send(&mut self.reporter, &mut self.control, hold, action).await,
                        Err(err) => {
                            warn!("macro {}: {:?}", id, err);
                            Ok(())
                        }
                    };
                }
                for step in body.steps() {
                    match resolve_step(step) {
                        Ok(MacroStep::Delay(delay)) => Timer::after(ms(delay)).await,
                        Ok(MacroStep::Output(action)) => {
                            send(&mut self.reporter, &mut self.control, hold, action).await?
                        }
                        Err(err) => warn!("macro {} step {}: {:?}", id, step, err),
                    }
                }
                Ok(())
            }
            action => send(&mut self.reporter, &mut self.control, hold, action).await,
        }
    }

    fn update_display(&mut self, now: Instant) {
        if let Some((_, at)) = self.pressed {
            if now.saturating_duration_since(at) > ms(self.timing.press_highlight_ms) {
                self.pressed = None;
                self.pad.refresh = true;
            }
        }

        let timeout = ms(self.timing.now_playing_timeout_ms);
        if self.pad.now_playing.expire(now, timeout) {
            self.pad.refresh = true;
        }

        if !core::mem::take(&mut self.pad.refresh) {
            return;
        }
        let frame = if self.pad.now_playing.is_showing(now, timeout) {
            Frame::now_playing(self.pad.now_playing.track())
        } else {
            Frame::layer(
                &self.pad.layers,
                self.pad.state.current(),
                self.pressed.map(|(key, _)| key),
            )
        };
        self.frames.signal(frame);
    }
}

/// Send the HID output or companion event for `action`. Layer functions and macro references
/// have no output of their own.
async fn send<W: ReportWriter, P: HostPort>(
    reporter: &mut Reporter<W>,
    control: &mut ControlChannel<P>,
    hold: Duration,
    action: Action<'_>,
) -> Result<(), OutputError> {
    match action {
        Action::NoOp | Action::LayerFn { .. } | Action::MacroRef(_) => Ok(()),
        Action::Consumer(code) => reporter.consumer_pulse(code).await,
        Action::Companion { name, fallback } => {
            let sent = match fallback {
                Some(code) => reporter.consumer_pulse(code).await,
                None => Ok(()),
            };
            if let Err(err) = control.send_app_event(&name).await {
                warn!("{} not sent: {:?}", name.as_str(), err);
            }
            sent
        }
        Action::Combo(keys) => reporter.tap_keys(&keys, hold).await,
        Action::SingleKey(code) => reporter.tap_keys(&[code], hold).await,
        Action::LiteralText(text) => reporter.type_text(text).await,
        Action::Mouse(MouseAction::Click(buttons)) => reporter.mouse_click(buttons).await,
        Action::Mouse(MouseAction::Move { x, y }) => reporter.mouse_move([x, y, 0, 0]).await,
        Action::Mouse(MouseAction::Scroll { wheel, pan }) => {
            reporter.mouse_move([0, 0, wheel, pan]).await
        }
    }
}

fn ms(ms: u32) -> Duration {
    Duration::from_millis(ms as u64)
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod test;
