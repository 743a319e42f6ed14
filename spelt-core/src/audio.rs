use anyhow::Result;

/// Playback device for word recordings. At most one playback is active; the
/// session stops the previous one before starting another.
pub trait AudioOutput {
    fn play(&mut self, audio_ref: &str) -> Result<()>;
    fn stop(&mut self);
}

