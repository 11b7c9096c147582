//! Audio subsystem.
//!
//! Mixing runs on its own thread. The frame loop talks to it only through a
//! command channel, so nothing here is shared mutably across threads.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;

pub trait AudioManager {
    fn play_once(&mut self, sound: &str);
    fn set_volume(&mut self, volume: f32);
    fn update(&mut self, dt: f32);
}

#[derive(Debug, Clone, PartialEq)]
enum AudioCommand {
    PlayOnce(String),
    SetVolume(f32),
    Shutdown,
}

/// Owns the mixer thread. Dropping it stops and joins the thread.
pub struct AudioThread {
    sender: Sender<AudioCommand>,
    worker: Option<JoinHandle<()>>,
    /// Seconds of audio time reported to screens via `update`.
    pub stream_time: f64,
}

impl AudioThread {
    /// Starts the mixer at full volume. `drivers` is the configured driver
    /// list; an empty list selects the platform default.
    pub fn start(drivers: &str) -> std::io::Result<Self> {
        let (sender, receiver) = mpsc::channel();
        let driver = drivers
            .split(',')
            .map(str::trim)
            .find(|d| !d.is_empty())
            .unwrap_or("default")
            .to_string();
        let worker = std::thread::Builder::new()
            .name("audio".to_string())
            .spawn(move || mixer_main(&driver, receiver))?;
        Ok(Self {
            sender,
            worker: Some(worker),
            stream_time: 0.0,
        })
    }

    fn send(&self, command: AudioCommand) {
        if self.sender.send(command).is_err() {
            log::warn!("Audio thread is gone; command dropped");
        }
    }
}

impl AudioManager for AudioThread {
    fn play_once(&mut self, sound: &str) {
        self.send(AudioCommand::PlayOnce(sound.to_string()));
    }

    fn set_volume(&mut self, volume: f32) {
        self.send(AudioCommand::SetVolume(volume.clamp(0.0, 1.0)));
    }

    fn update(&mut self, dt: f32) {
        self.stream_time += f64::from(dt);
    }
}

impl Drop for AudioThread {
    fn drop(&mut self) {
        let _ = self.sender.send(AudioCommand::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Audio thread panicked");
            }
        }
        log::debug!("Audio thread stopped");
    }
}

fn mixer_main(driver: &str, commands: Receiver<AudioCommand>) {
    log::info!("Audio driver: {driver}");
    let mut volume = 1.0_f32;
    // Blocks until the next command; a closed channel also ends the thread.
    while let Ok(command) = commands.recv() {
        match command {
            AudioCommand::PlayOnce(sound) => log::trace!("Play '{sound}' at {volume:.2}"),
            AudioCommand::SetVolume(v) => {
                volume = v;
                log::debug!("Volume {volume:.2}");
            }
            AudioCommand::Shutdown => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_starts_and_stops() {
        let mut audio = AudioThread::start("").expect("spawn audio thread");
        audio.play_once("common coin");
        audio.set_volume(2.0);
        audio.update(0.25);
        assert_eq!(audio.stream_time, 0.25);
        drop(audio);
    }

    #[test]
    fn first_listed_driver_is_used() {
        let audio = AudioThread::start(" , alsa, pulse").expect("spawn audio thread");
        drop(audio);
    }
}
