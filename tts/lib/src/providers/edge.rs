//! Microsoft Edge "read aloud" cloud TTS provider.
//!
//! Synthesis is a single WebSocket turn: a `speech.config` frame selects MP3
//! output, an `ssml` frame carries the text with its voice, rate and pitch,
//! and the service answers with binary audio frames until `turn.end`.
//!
//! No API key is needed. Requests carry the public trusted-client token plus a
//! `Sec-MS-GEC` value derived from the current time.
//!
//! ## Examples
//!
//! ```ignore
//! use tts_lib::{EdgeTtsProvider, SpeechRequest, Synthesizer};
//!
//! let provider = EdgeTtsProvider::new();
//! let mp3 = provider.synthesize(&SpeechRequest::new("Hello, world!")).await?;
//! ```

use std::io::ErrorKind;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};
use tracing::debug;
use tungstenite::client::IntoClientRequest;
use tungstenite::error::UrlError;
use tungstenite::http::{HeaderValue, Uri};
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{HandshakeError, Message, WebSocket};

use crate::errors::TtsError;
use crate::traits::{Synthesizer, VoiceInventory};
use crate::types::{SpeechRequest, Voice};

/// Host serving both synthesis and the voice list.
pub const SERVICE_HOST: &str = "speech.platform.bing.com";

const SYNTHESIS_URL: &str =
    "wss://speech.platform.bing.com/consumer/speech/synthesize/readaloud/edge/v1";
const VOICES_URL: &str =
    "https://speech.platform.bing.com/consumer/speech/synthesize/readaloud/voices/list";

const TRUSTED_CLIENT_TOKEN: &str = "6A5AA1D4EAFF4E9FB37E23D68491D6F4";
const SEC_MS_GEC_VERSION: &str = "1-130.0.2849.68";
const ORIGIN: &str = "chrome-extension://jdiccldimpdaibmpdkjnbmckianbfold";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36 Edg/130.0.0.0";

const OUTPUT_FORMAT: &str = "audio-24khz-48kbitrate-mono-mp3";
const AUDIO_PATH_HEADER: &[u8] = b"Path:audio\r\n";
const TURN_END: &str = "Path:turn.end";

/// Upper bound for opening the TCP connection.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// How long the service may stay silent before the session is abandoned.
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Seconds between 1601-01-01 (Windows file time epoch) and 1970-01-01.
const WIN_EPOCH_OFFSET_SECS: u64 = 11_644_473_600;

/// Edge read-aloud provider.
///
/// Implements [`Synthesizer`] and [`VoiceInventory`].
#[derive(Debug, Clone)]
pub struct EdgeTtsProvider {
    synthesis_url: String,
    voices_url: String,
    idle_timeout: Duration,
    http: reqwest::Client,
}

impl Default for EdgeTtsProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl EdgeTtsProvider {
    /// Create a provider for the public service.
    pub fn new() -> Self {
        Self::with_endpoints(SYNTHESIS_URL, VOICES_URL)
    }

    /// Create a provider against custom endpoints.
    ///
    /// Useful for testing with mock servers.
    pub fn with_endpoints(synthesis_url: impl Into<String>, voices_url: impl Into<String>) -> Self {
        Self {
            synthesis_url: synthesis_url.into(),
            voices_url: voices_url.into(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            http: reqwest::Client::new(),
        }
    }

    /// Give up on a session once the service has been silent for `timeout`.
    ///
    /// Also caps the connect timeout. Defaults to 30 seconds.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    fn session_url(&self) -> String {
        format!(
            "{}?TrustedClientToken={}&Sec-MS-GEC={}&Sec-MS-GEC-Version={}&ConnectionId={}",
            self.synthesis_url,
            TRUSTED_CLIENT_TOKEN,
            sec_ms_gec(unix_now()),
            SEC_MS_GEC_VERSION,
            new_id()
        )
    }

    fn voice_list_url(&self) -> String {
        format!(
            "{}?trustedclienttoken={}&Sec-MS-GEC={}&Sec-MS-GEC-Version={}",
            self.voices_url,
            TRUSTED_CLIENT_TOKEN,
            sec_ms_gec(unix_now()),
            SEC_MS_GEC_VERSION
        )
    }
}

impl Synthesizer for EdgeTtsProvider {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<Vec<u8>, TtsError> {
        debug!(
            voice = %request.voice,
            rate = %request.rate,
            pitch = %request.pitch,
            chars = request.text.chars().count(),
            "requesting speech synthesis"
        );

        let url = self.session_url();
        let request = request.clone();
        let timeout = self.idle_timeout;
        tokio::task::spawn_blocking(move || run_session(&url, &request, timeout)).await?
    }
}

impl VoiceInventory for EdgeTtsProvider {
    async fn list_voices(&self) -> Result<Vec<Voice>, TtsError> {
        let body = self
            .http
            .get(self.voice_list_url())
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_voices(&body)
    }
}

// ============================================================================
// WebSocket Session
// ============================================================================

fn run_session(
    url: &str,
    request: &SpeechRequest,
    timeout: Duration,
) -> Result<Vec<u8>, TtsError> {
    let mut handshake = url.into_client_request().map_err(TtsError::connection)?;
    let headers = handshake.headers_mut();
    headers.insert("Origin", HeaderValue::from_static(ORIGIN));
    headers.insert("User-Agent", HeaderValue::from_static(USER_AGENT));
    headers.insert("Pragma", HeaderValue::from_static("no-cache"));
    headers.insert("Cache-Control", HeaderValue::from_static("no-cache"));

    let stream = open_stream(handshake.uri(), timeout)?;
    let (mut socket, _) = tungstenite::client_tls(handshake, stream).map_err(|e| match e {
        HandshakeError::Failure(err) => classify(err, timeout, TtsError::connection),
        // a blocking socket only interrupts the handshake when a read timed out
        HandshakeError::Interrupted(_) => TtsError::Timeout { timeout },
    })?;

    let result = exchange(&mut socket, request, timeout);
    let _ = socket.close(None);
    result
}

/// Connect with a bounded wait and put read/write timeouts on the socket.
fn open_stream(uri: &Uri, timeout: Duration) -> Result<TcpStream, TtsError> {
    let host = uri
        .host()
        .map(|host| host.trim_start_matches('[').trim_end_matches(']'))
        .ok_or_else(|| TtsError::connection(tungstenite::Error::Url(UrlError::NoHostName)))?;
    let port = uri.port_u16().unwrap_or(match uri.scheme_str() {
        Some("wss") => 443,
        _ => 80,
    });

    let addrs = (host, port)
        .to_socket_addrs()
        .map_err(|e| io_failure(e, timeout, TtsError::connection))?;

    let mut last_error = std::io::Error::new(ErrorKind::NotFound, format!("no address for {host}"));
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT.min(timeout)) {
            Ok(stream) => {
                let configured = stream
                    .set_read_timeout(Some(timeout))
                    .and_then(|()| stream.set_write_timeout(Some(timeout)))
                    .and_then(|()| stream.set_nodelay(true));
                return match configured {
                    Ok(()) => Ok(stream),
                    Err(e) => Err(io_failure(e, timeout, TtsError::connection)),
                };
            }
            Err(e) => {
                debug!(%addr, error = %e, "connect attempt failed");
                last_error = e;
            }
        }
    }

    Err(io_failure(last_error, timeout, TtsError::connection))
}

/// Turn socket timeouts into `TtsError::Timeout`, everything else into `wrap`.
fn classify(
    err: tungstenite::Error,
    timeout: Duration,
    wrap: fn(tungstenite::Error) -> TtsError,
) -> TtsError {
    match err {
        tungstenite::Error::Io(e) => io_failure(e, timeout, wrap),
        other => wrap(other),
    }
}

fn io_failure(
    err: std::io::Error,
    timeout: Duration,
    wrap: fn(tungstenite::Error) -> TtsError,
) -> TtsError {
    match err.kind() {
        // unix reports an expired socket timeout as WouldBlock, windows as TimedOut
        ErrorKind::WouldBlock | ErrorKind::TimedOut => TtsError::Timeout { timeout },
        _ => wrap(tungstenite::Error::Io(err)),
    }
}

fn exchange(
    socket: &mut WebSocket<MaybeTlsStream<TcpStream>>,
    request: &SpeechRequest,
    timeout: Duration,
) -> Result<Vec<u8>, TtsError> {
    let timestamp = timestamp();
    socket
        .send(Message::text(config_message(&timestamp)))
        .map_err(|e| classify(e, timeout, TtsError::websocket))?;
    socket
        .send(Message::text(ssml_message(&new_id(), &timestamp, request)))
        .map_err(|e| classify(e, timeout, TtsError::websocket))?;

    let mut audio = Vec::new();
    let mut last_data = Instant::now();
    loop {
        // pings and other control frames do not count as progress
        if last_data.elapsed() > timeout {
            return Err(TtsError::Timeout { timeout });
        }

        match socket.read() {
            Ok(Message::Binary(frame)) => {
                last_data = Instant::now();
                if let Some(chunk) = audio_payload(&frame) {
                    audio.extend_from_slice(chunk);
                }
            }
            Ok(Message::Text(text)) => {
                last_data = Instant::now();
                if text.as_str().contains(TURN_END) {
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => break,
            Err(e) => return Err(classify(e, timeout, TtsError::websocket)),
        }
    }

    if audio.is_empty() {
        return Err(TtsError::NoAudioReceived {
            voice: request.voice.clone(),
        });
    }

    debug!(bytes = audio.len(), "speech synthesis complete");
    Ok(audio)
}

// ============================================================================
// Protocol Helpers
// ============================================================================

/// Audio bytes carried by a binary frame, if it is an audio frame.
///
/// Frames start with a big-endian `u16` header length, then the header,
/// then the payload.
fn audio_payload(frame: &[u8]) -> Option<&[u8]> {
    if frame.len() < 2 {
        return None;
    }
    let header_len = u16::from_be_bytes([frame[0], frame[1]]) as usize;
    let start = 2 + header_len;
    if frame.len() <= start {
        return None;
    }

    let header = &frame[2..start];
    let is_audio = header
        .windows(AUDIO_PATH_HEADER.len())
        .any(|window| window == AUDIO_PATH_HEADER);
    is_audio.then(|| &frame[start..])
}

fn config_message(timestamp: &str) -> String {
    let body = serde_json::json!({
        "context": {
            "synthesis": {
                "audio": {
                    "metadataoptions": {
                        "sentenceBoundaryEnabled": "false",
                        "wordBoundaryEnabled": "false"
                    },
                    "outputFormat": OUTPUT_FORMAT
                }
            }
        }
    });

    format!(
        "X-Timestamp:{timestamp}\r\nContent-Type:application/json; charset=utf-8\r\nPath:speech.config\r\n\r\n{body}"
    )
}

fn ssml_message(request_id: &str, timestamp: &str, request: &SpeechRequest) -> String {
    format!(
        "X-RequestId:{request_id}\r\nContent-Type:application/ssml+xml\r\nX-Timestamp:{timestamp}\r\nPath:ssml\r\n\r\n{}",
        build_ssml(request)
    )
}

fn build_ssml(request: &SpeechRequest) -> String {
    format!(
        "<speak version='1.0' xmlns='http://www.w3.org/2001/10/synthesis' xml:lang='en-US'>\
         <voice name='{}'><prosody pitch='{}' rate='{}' volume='+0%'>{}</prosody></voice></speak>",
        xml_escape(&request.voice),
        xml_escape(&request.pitch),
        xml_escape(&request.rate),
        xml_escape(&request.text)
    )
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// The `Sec-MS-GEC` token for a given unix time.
///
/// Uppercase hex SHA-256 of the Windows file time (rounded down to five
/// minutes, in 100ns ticks) followed by the trusted client token.
fn sec_ms_gec(unix_secs: u64) -> String {
    let mut secs = unix_secs + WIN_EPOCH_OFFSET_SECS;
    secs -= secs % 300;
    let ticks = secs * 10_000_000;

    let digest = Sha256::digest(format!("{ticks}{TRUSTED_CLIENT_TOKEN}").as_bytes());
    hex::encode_upper(digest)
}

fn parse_voices(body: &str) -> Result<Vec<Voice>, TtsError> {
    Ok(serde_json::from_str(body)?)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn timestamp() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

// ============================================================================
// Tests
// ============================================================================
