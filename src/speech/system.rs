//! Process-backed local speech adapters.
//!
//! Synthesis shells out to whichever system engine is present (`spd-say`,
//! `espeak-ng`, macOS `say`). Recognition runs a user-configured capture
//! command and treats its stdout lines as transcripts: every line is an
//! interim result, the last line before exit is the final transcript.

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::oneshot;
use tracing::debug;

use super::{
    resolve_voice, LocalVoice, Recognizer, RecognizerEvent, RecognizerEventSender, SpeechRequest,
    Synthesizer,
};
use crate::settings::VoiceId;

/// Map a speed multiplier (0.5..=2.0) to the -100..100 percent scale used
/// by speech-dispatcher.
fn rate_percent(speed: f32) -> i32 {
    (((speed - 1.0) * 100.0).round() as i32).clamp(-100, 100)
}

/// Map a volume (0..=1) to the -100..100 percent scale used by
/// speech-dispatcher.
fn volume_percent(volume: f32) -> i32 {
    ((volume * 200.0 - 100.0).round() as i32).clamp(-100, 100)
}

/// Map a speed multiplier to espeak's words-per-minute scale (175 = 1x).
fn espeak_wpm(speed: f32) -> i32 {
    (175.0 * speed).round() as i32
}

/// espeak voice code for a resolved voice. The female variant uses
/// espeak's `+f3` voice modifier.
fn espeak_voice(voice: Option<&LocalVoice>, id: VoiceId) -> String {
    if id == VoiceId::Female {
        return "en+f3".to_string();
    }
    match voice {
        Some(v) => v.language.to_lowercase(),
        None => "en".to_string(),
    }
}

/// Local synthesis via the system speech engine.
pub struct SystemSynthesizer {
    voices: Vec<LocalVoice>,
}

impl SystemSynthesizer {
    pub fn new() -> Self {
        // Language variants the system engines understand; resolution picks
        // among these by tag or name substring.
        Self {
            voices: vec![
                LocalVoice::new("English (America)", "en-US"),
                LocalVoice::new("English (Great Britain)", "en-GB"),
                LocalVoice::new("English (Australia)", "en-AU"),
                LocalVoice::new("English female", "en-US"),
            ],
        }
    }

    pub fn voices(&self) -> &[LocalVoice] {
        &self.voices
    }
}

impl Default for SystemSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Synthesizer for SystemSynthesizer {
    fn speak(&mut self, request: SpeechRequest) -> anyhow::Result<()> {
        let voice = resolve_voice(&self.voices, request.voice);
        debug!(
            text_len = request.text.len(),
            voice = voice.map(|v| v.name.as_str()).unwrap_or("platform default"),
            "Local synthesis"
        );

        let mut spd = std::process::Command::new("spd-say");
        spd.arg("-r")
            .arg(rate_percent(request.rate).to_string())
            .arg("-i")
            .arg(volume_percent(request.volume).to_string());
        if let Some(v) = voice {
            spd.arg("-l").arg(&v.language);
        }
        spd.arg(&request.text).stdout(Stdio::null()).stderr(Stdio::null());
        if spd.spawn().is_ok() {
            return Ok(());
        }

        let mut espeak = std::process::Command::new("espeak-ng");
        espeak
            .arg("-s")
            .arg(espeak_wpm(request.rate).to_string())
            .arg("-a")
            .arg(((request.volume * 200.0).round() as i32).to_string())
            .arg("-v")
            .arg(espeak_voice(voice, request.voice))
            .arg(&request.text)
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        if espeak.spawn().is_ok() {
            return Ok(());
        }

        let mut say = std::process::Command::new("say");
        say.arg("-r")
            .arg(espeak_wpm(request.rate).to_string())
            .arg(&request.text)
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        if say.spawn().is_ok() {
            return Ok(());
        }

        anyhow::bail!("no system speech engine found (tried spd-say, espeak-ng, say)")
    }
}

/// Local recognition via a user-configured capture command.
pub struct ProcessRecognizer {
    command: Option<String>,
    events: RecognizerEventSender,
    cancel: Option<oneshot::Sender<()>>,
}

impl ProcessRecognizer {
    pub fn new(command: Option<String>, events: RecognizerEventSender) -> Self {
        Self {
            command,
            events,
            cancel: None,
        }
    }
}

impl Recognizer for ProcessRecognizer {
    fn start(&mut self) -> anyhow::Result<()> {
        let Some(cmdline) = self.command.clone() else {
            anyhow::bail!("no local recognizer configured (set recognizer_command in config.json)");
        };

        let mut parts = cmdline.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| anyhow::anyhow!("recognizer_command is empty"))?
            .to_string();
        let args: Vec<String> = parts.map(str::to_string).collect();

        let mut child = tokio::process::Command::new(&program)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| anyhow::anyhow!("failed to launch recognizer '{program}': {e}"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow::anyhow!("recognizer stdout unavailable"))?;

        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();
        self.cancel = Some(cancel_tx);
        let events = self.events.clone();

        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            let mut last: Option<String> = None;
            loop {
                tokio::select! {
                    _ = &mut cancel_rx => {
                        let _ = child.start_kill();
                        let _ = child.wait().await;
                        let _ = events.send(RecognizerEvent::Ended);
                        return;
                    }
                    line = lines.next_line() => match line {
                        Ok(Some(text)) => {
                            let text = text.trim().to_string();
                            if text.is_empty() {
                                continue;
                            }
                            let _ = events.send(RecognizerEvent::Interim {
                                transcript: text.clone(),
                            });
                            last = Some(text);
                        }
                        Ok(None) => break,
                        Err(e) => {
                            let _ = events.send(RecognizerEvent::Error {
                                message: format!("recognizer read failed: {e}"),
                            });
                            let _ = child.wait().await;
                            return;
                        }
                    }
                }
            }
            let _ = child.wait().await;
            match last {
                Some(transcript) => {
                    let _ = events.send(RecognizerEvent::Final { transcript });
                }
                None => {
                    let _ = events.send(RecognizerEvent::Ended);
                }
            }
        });

        Ok(())
    }

    fn stop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }
}
