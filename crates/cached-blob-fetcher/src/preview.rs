//! Resource keys for track previews

/// URL of the backend endpoint serving a track preview's audio
///
/// This is the resource key used for previews, so the same track always maps
/// to the same store entry.
pub fn preview_audio_url(api_base: &str, video_id: &str) -> String {
    format!(
        "{}/recommend/youtube-audio?video_id={}",
        api_base.trim_end_matches('/'),
        urlencoding::encode(video_id)
    )
}
