// MIT License - Copyright (c) 2026 Peter Wright
// Hardware capabilities the alarm core drives

/// Buzzer and siren actions the alarm core calls.
///
/// Every method defaults to a no-op so tests and headless setups only
/// implement what they observe. Implementations must return quickly: they
/// run on the alarm's event-processing task.
pub trait AlarmHooks: Send + 'static {
    /// Short low tone, emitted for digit keys.
    fn low_beep(&mut self) {}

    /// Short medium tone, emitted for `*`, `#` and every countdown tick.
    fn medium_beep(&mut self) {}

    /// Short high tone, emitted for letter keys.
    fn high_beep(&mut self) {}

    /// Start the siren. Called once when the alarm becomes triggered.
    fn start_sound(&mut self) {}

    /// Stop the siren. Called on every disarm, sounding or not.
    fn stop_sound(&mut self) {}
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl AlarmHooks for NoopHooks {}

impl<H: AlarmHooks + ?Sized> AlarmHooks for Box<H> {
    fn low_beep(&mut self) {
        (**self).low_beep()
    }

    fn medium_beep(&mut self) {
        (**self).medium_beep()
    }

    fn high_beep(&mut self) {
        (**self).high_beep()
    }

    fn start_sound(&mut self) {
        (**self).start_sound()
    }

    fn stop_sound(&mut self) {
        (**self).stop_sound()
    }
}
