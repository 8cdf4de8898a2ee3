/// Maps a pixel offset within `[0, extent)` onto the absolute 16-bit range
/// the HID injector expects: 0 lands on -32768 and the far edge approaches
/// 32767. The result is clamped so positions reported slightly outside the
/// viewport can never leave the range.
///
/// Callers must guard `extent <= 0` themselves; a viewport that is not laid
/// out yet has no meaningful coordinate space and the send is skipped
/// instead (see `MouseForwarder::flush_moves`).
pub fn to_hid(value: i32, extent: i32) -> i16 {
    debug_assert!(extent > 0);
    let scaled = value as f64 / extent as f64 * 65535.0 - 32768.0;
    scaled.round().clamp(-32768.0, 32767.0) as i16
}
