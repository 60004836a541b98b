use async_trait::async_trait;
use reqwest::header::{ACCEPT_LANGUAGE, COOKIE};
use reqwest::Response;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use super::{Snippet, SourceError, TranscriptHandle, TranscriptSource, TranscriptVariant};

const WATCH_URL: &str = "https://www.youtube.com/watch";
const INNERTUBE_PLAYER_URL: &str = "https://www.youtube.com/youtubei/v1/player";
const INNERTUBE_CLIENT_NAME: &str = "ANDROID";
const INNERTUBE_CLIENT_VERSION: &str = "20.10.38";

const API_KEY_MARKER: &str = "\"INNERTUBE_API_KEY\":";
const CONSENT_FORM_MARKER: &str = "action=\"https://consent.youtube.com/s\"";
const CONSENT_VALUE_MARKER: &str = "name=\"v\" value=\"";
const RECAPTCHA_MARKER: &str = "class=\"g-recaptcha\"";
const PO_TOKEN_MARKER: &str = "&exp=xpe";

const REASON_BOT_DETECTED: &str = "Sign in to confirm you\u{2019}re not a bot";
const REASON_AGE_RESTRICTED: &str = "This video may be inappropriate for some users.";
const REASON_VIDEO_UNAVAILABLE: &str = "This video is unavailable";

/// Transcript source backed by YouTube's innertube player API
pub struct YoutubeTranscriptSource {
    client: reqwest::Client,
    accept_language: String,
}

impl YoutubeTranscriptSource {
    pub fn new(accept_language: impl Into<String>) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            accept_language: accept_language.into(),
        })
    }

    /// Fetch the watch page, accepting the cookie consent form if YouTube shows one
    async fn fetch_video_html(&self, video_id: &str) -> Result<String, SourceError> {
        let html = self.fetch_html(video_id, None).await?;
        let Some(cookie) = consent_cookie(video_id, &html)? else {
            return Ok(html);
        };

        tracing::debug!("Consent form shown for {}, retrying with consent cookie", video_id);

        let html = self.fetch_html(video_id, Some(&cookie)).await?;
        ensure_consent_accepted(video_id, &html)?;

        Ok(html)
    }

    async fn fetch_html(&self, video_id: &str, cookie: Option<&str>) -> Result<String, SourceError> {
        let url = Url::parse_with_params(WATCH_URL, &[("v", video_id)])
            .map_err(|e| SourceError::Malformed(format!("invalid watch URL: {}", e)))?;

        let mut request = self
            .client
            .get(url)
            .header(ACCEPT_LANGUAGE, &self.accept_language);
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }

        let response = check_status(request.send().await?, video_id)?;
        Ok(response.text().await?)
    }

    async fn fetch_player_response(&self, video_id: &str, api_key: &str) -> Result<Value, SourceError> {
        let url = Url::parse_with_params(INNERTUBE_PLAYER_URL, &[("key", api_key)])
            .map_err(|e| SourceError::Malformed(format!("invalid player URL: {}", e)))?;

        let body = json!({
            "context": {
                "client": {
                    "clientName": INNERTUBE_CLIENT_NAME,
                    "clientVersion": INNERTUBE_CLIENT_VERSION,
                }
            },
            "videoId": video_id,
        });

        let response = self
            .client
            .post(url)
            .header(ACCEPT_LANGUAGE, &self.accept_language)
            .json(&body)
            .send()
            .await?;

        let response = check_status(response, video_id)?;
        Ok(response.json::<Value>().await?)
    }
}

#[async_trait]
impl TranscriptSource for YoutubeTranscriptSource {
    async fn list(&self, video_id: &str) -> Result<Vec<TranscriptVariant>, SourceError> {
        tracing::debug!("Listing transcripts for video: {}", video_id);

        let html = self.fetch_video_html(video_id).await?;
        let api_key =
            extract_innertube_api_key(&html).ok_or_else(|| api_key_error(video_id, &html))?;

        let player = self.fetch_player_response(video_id, api_key).await?;
        let variants = parse_player_response(video_id, player)?;

        tracing::debug!("Found {} transcript(s) for {}", variants.len(), video_id);
        Ok(variants)
    }

    async fn fetch(&self, handle: &TranscriptHandle) -> Result<Vec<Snippet>, SourceError> {
        if handle.url().contains(PO_TOKEN_MARKER) {
            return Err(unretrievable(
                handle.video_id(),
                "the transcript requires a proof-of-origin token",
            ));
        }

        let url = transcript_body_url(handle)?;
        tracing::debug!("Fetching transcript body: {}", url);

        let response = check_status(self.client.get(url).send().await?, handle.video_id())?;
        let body = response.text().await?;

        parse_timed_text(&body)
    }

    fn service_name(&self) -> &'static str {
        "YouTube"
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerResponse {
    playability_status: Option<PlayabilityStatus>,
    captions: Option<Captions>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayabilityStatus {
    status: Option<String>,
    reason: Option<String>,
    error_screen: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Captions {
    player_captions_tracklist_renderer: Option<TracklistRenderer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TracklistRenderer {
    caption_tracks: Option<Vec<CaptionTrack>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    language_code: String,
    #[serde(default)]
    name: TrackName,
    kind: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackName {
    simple_text: Option<String>,
    #[serde(default)]
    runs: Vec<TextRun>,
}

#[derive(Debug, Deserialize)]
struct TextRun {
    text: String,
}

impl TrackName {
    /// The first text run, or `simpleText` for tracks that carry no runs
    fn into_text(self) -> String {
        match self.runs.into_iter().next() {
            Some(run) => run.text,
            None => self.simple_text.unwrap_or_default(),
        }
    }
}

/// Turn an innertube player response into the video's transcript variants.
///
/// Manually created transcripts come first, then generated ones, each group in
/// the order YouTube lists them.
pub fn parse_player_response(video_id: &str, body: Value) -> Result<Vec<TranscriptVariant>, SourceError> {
    let response: PlayerResponse = serde_json::from_value(body)?;

    check_playability(video_id, response.playability_status.as_ref())?;

    let tracks = response
        .captions
        .and_then(|c| c.player_captions_tracklist_renderer)
        .and_then(|r| r.caption_tracks)
        .ok_or_else(|| SourceError::TranscriptsDisabled {
            video_id: video_id.to_string(),
        })?;

    let (generated, mut manual): (Vec<_>, Vec<_>) = tracks
        .into_iter()
        .map(|track| TranscriptVariant {
            is_generated: track.kind.as_deref() == Some("asr"),
            handle: TranscriptHandle::new(video_id, track.base_url.replace("&fmt=srv3", "")),
            language_name: track.name.into_text(),
            language_code: track.language_code,
        })
        .partition(|variant| variant.is_generated);

    manual.extend(generated);
    Ok(manual)
}

fn check_playability(video_id: &str, playability: Option<&PlayabilityStatus>) -> Result<(), SourceError> {
    let Some(playability) = playability else {
        return Ok(());
    };
    let status = match playability.status.as_deref() {
        None | Some("OK") => return Ok(()),
        Some(status) => status,
    };
    let reason = playability.reason.as_deref().unwrap_or_default();

    if status == "LOGIN_REQUIRED" {
        if reason == REASON_BOT_DETECTED {
            return Err(unretrievable(video_id, "YouTube is asking to confirm this is not a bot"));
        }
        if reason == REASON_AGE_RESTRICTED {
            return Err(unretrievable(video_id, "the video is age restricted"));
        }
    }

    if status == "ERROR" && reason == REASON_VIDEO_UNAVAILABLE {
        if video_id.starts_with("http://") || video_id.starts_with("https://") {
            return Err(unretrievable(video_id, "expected a video ID, got a URL"));
        }
        return Err(SourceError::VideoUnavailable {
            video_id: video_id.to_string(),
        });
    }

    let subreasons: Vec<&str> = playability
        .error_screen
        .as_ref()
        .and_then(|screen| screen.pointer("/playerErrorMessageRenderer/subreason/runs"))
        .and_then(Value::as_array)
        .map(|runs| runs.iter().filter_map(|run| run["text"].as_str()).collect())
        .unwrap_or_default();

    let mut detail = format!("the video is unplayable ({})", status);
    if !reason.is_empty() {
        detail.push_str(": ");
        detail.push_str(reason);
    }
    for subreason in subreasons {
        detail.push_str("; ");
        detail.push_str(subreason);
    }

    Err(unretrievable(video_id, detail))
}

#[derive(Debug, Deserialize)]
struct TimedText {
    #[serde(default)]
    events: Vec<TimedTextEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimedTextEvent {
    #[serde(default)]
    t_start_ms: u64,
    #[serde(default)]
    d_duration_ms: u64,
    #[serde(default)]
    segs: Vec<TimedTextSegment>,
    a_append: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct TimedTextSegment {
    #[serde(default)]
    utf8: String,
}

/// Parse a `json3` timed-text body into snippets.
///
/// Line-break append events and events without text are dropped.
pub fn parse_timed_text(body: &str) -> Result<Vec<Snippet>, SourceError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    let timed_text: TimedText = serde_json::from_str(body)?;

    let snippets = timed_text
        .events
        .into_iter()
        .filter(|event| event.a_append.is_none())
        .filter_map(|event| {
            let text: String = event.segs.iter().map(|seg| seg.utf8.as_str()).collect();
            if text.trim().is_empty() {
                return None;
            }
            Some(Snippet {
                text,
                start: event.t_start_ms as f64 / 1000.0,
                duration: event.d_duration_ms as f64 / 1000.0,
            })
        })
        .collect();

    Ok(snippets)
}

/// Location of the transcript body in `json3` format
pub fn transcript_body_url(handle: &TranscriptHandle) -> Result<Url, SourceError> {
    let mut url = Url::parse(handle.url())
        .map_err(|e| SourceError::Malformed(format!("invalid transcript URL {}: {}", handle.url(), e)))?;

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "fmt")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(pairs)
        .append_pair("fmt", "json3");

    Ok(url)
}

/// Find the innertube API key embedded in a watch page
pub fn extract_innertube_api_key(html: &str) -> Option<&str> {
    let start = html.find(API_KEY_MARKER)? + API_KEY_MARKER.len();
    let rest = html[start..].trim_start().strip_prefix('"')?;
    let end = rest.find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))?;

    let key = &rest[..end];
    (!key.is_empty() && rest[end..].starts_with('"')).then_some(key)
}

/// Why a watch page without an API key cannot be used
pub fn api_key_error(video_id: &str, html: &str) -> SourceError {
    if html.contains(RECAPTCHA_MARKER) {
        unretrievable(video_id, "YouTube is blocking requests from this IP")
    } else {
        unretrievable(video_id, "the video page could not be parsed")
    }
}

/// Find the value YouTube expects back in the `CONSENT` cookie
pub fn extract_consent_value(html: &str) -> Option<&str> {
    let start = html.find(CONSENT_VALUE_MARKER)? + CONSENT_VALUE_MARKER.len();
    let end = html[start..].find('"')?;
    Some(&html[start..start + end])
}

/// Cookie accepting the consent form, if the page is one.
///
/// `None` means the page is the real watch page.
pub fn consent_cookie(video_id: &str, html: &str) -> Result<Option<String>, SourceError> {
    if !html.contains(CONSENT_FORM_MARKER) {
        return Ok(None);
    }

    extract_consent_value(html)
        .map(|value| Some(format!("CONSENT=YES+{}", value)))
        .ok_or_else(|| unretrievable(video_id, "failed to give consent to saving cookies"))
}

/// Fail if the page fetched with the consent cookie is still the consent form
pub fn ensure_consent_accepted(video_id: &str, html: &str) -> Result<(), SourceError> {
    if html.contains(CONSENT_FORM_MARKER) {
        return Err(unretrievable(
            video_id,
            "consent form still shown after accepting cookies",
        ));
    }
    Ok(())
}

fn check_status(response: Response, video_id: &str) -> Result<Response, SourceError> {
    let status = response.status();
    if !status.is_success() {
        return Err(unretrievable(video_id, format!("request to YouTube failed: HTTP {}", status)));
    }
    Ok(response)
}

fn unretrievable(video_id: &str, reason: impl Into<String>) -> SourceError {
    SourceError::Unretrievable {
        video_id: video_id.to_string(),
        reason: reason.into(),
    }
}
