//! Push sources for the orientation signal.
//!
//! A source delivers booleans ("Y axis is horizontal") into an [`Outbox`]
//! from its own task. The session owns the matching inbox and evaluates the
//! samples one at a time.

use std::fs;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use engine::inbox::Outbox;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::orientation::{AccelSample, OrientationClassifier};

/// Roughly the cadence of a UI-rate motion sensor.
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(60);

#[derive(Debug, Error)]
pub enum SensorError {
    #[error("sensor is already subscribed")]
    AlreadySubscribed,
    #[error("sensor input was already consumed")]
    Exhausted,
    #[error("sensor needs a tokio runtime to deliver samples")]
    NoRuntime,
    #[error("sensor script has no readings")]
    EmptyScript,
    #[error("sensor script line {line}: {reason}")]
    Script { line: usize, reason: String },
    #[error("failed to start sensor reader thread: {0}")]
    Spawn(#[source] io::Error),
    #[error("failed to read sensor script {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorReading {
    Level(bool),
    Accel(AccelSample),
}

impl SensorReading {
    pub fn is_horizontal(self, classifier: &OrientationClassifier) -> bool {
        match self {
            SensorReading::Level(horizontal) => horizontal,
            SensorReading::Accel(sample) => classifier.is_horizontal(sample),
        }
    }
}

/// Parses one line of sensor input: `h`/`horizontal`, `v`/`vertical`, or an
/// `x y z` accelerometer triple. Blank lines and `#` comments yield `None`.
pub fn parse_reading(line: &str) -> Result<Option<SensorReading>, String> {
    let line = line.split('#').next().unwrap_or_default().trim();
    if line.is_empty() {
        return Ok(None);
    }

    match line.to_ascii_lowercase().as_str() {
        "h" | "horizontal" => return Ok(Some(SensorReading::Level(true))),
        "v" | "vertical" => return Ok(Some(SensorReading::Level(false))),
        _ => {}
    }

    let values = line
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<f32>()
                .map_err(|_| format!("not a number: {part:?}"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    match values.as_slice() {
        [x, y, z] => Ok(Some(SensorReading::Accel(AccelSample::new(*x, *y, *z)))),
        _ => Err(format!(
            "expected h, v or three accelerometer values, got {} value(s)",
            values.len()
        )),
    }
}

pub fn parse_script(text: &str) -> Result<Vec<SensorReading>, SensorError> {
    let mut readings = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let reading = parse_reading(line).map_err(|reason| SensorError::Script {
            line: index + 1,
            reason,
        })?;
        readings.extend(reading);
    }
    Ok(readings)
}

pub trait SensorSource {
    fn subscribe(&mut self, sink: Outbox<bool>) -> Result<(), SensorError>;

    /// Stops delivery. Calling it while unsubscribed does nothing.
    fn unsubscribe(&mut self);

    fn is_subscribed(&self) -> bool;
}

/// Producer task that is aborted when stopped or dropped.
#[derive(Debug, Default)]
struct Producer {
    task: Option<JoinHandle<()>>,
}

impl Producer {
    fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    fn start<F>(&mut self, work: F) -> Result<(), SensorError>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        if self.is_running() {
            return Err(SensorError::AlreadySubscribed);
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| SensorError::NoRuntime)?;
        self.task = Some(runtime.spawn(work));
        Ok(())
    }

    fn stop(&mut self) -> bool {
        match self.task.take() {
            Some(task) => {
                task.abort();
                true
            }
            None => false,
        }
    }
}

impl Drop for Producer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Replays a fixed list of readings at a steady cadence.
#[derive(Debug)]
pub struct ScriptedSensor {
    readings: Arc<[SensorReading]>,
    classifier: OrientationClassifier,
    interval: Duration,
    looping: bool,
    producer: Producer,
}

impl ScriptedSensor {
    pub fn new(readings: Vec<SensorReading>, classifier: OrientationClassifier) -> Self {
        Self {
            readings: readings.into(),
            classifier,
            interval: DEFAULT_SAMPLE_INTERVAL,
            looping: false,
            producer: Producer::default(),
        }
    }

    pub fn from_file(
        path: impl AsRef<Path>,
        classifier: OrientationClassifier,
    ) -> Result<Self, SensorError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SensorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let readings = parse_script(&text)?;
        debug!(path = %path.display(), readings = readings.len(), "loaded sensor script");
        Ok(Self::new(readings, classifier))
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        // tokio intervals reject a zero period.
        self.interval = interval.max(Duration::from_millis(1));
        self
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn readings(&self) -> &[SensorReading] {
        &self.readings
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl SensorSource for ScriptedSensor {
    fn subscribe(&mut self, sink: Outbox<bool>) -> Result<(), SensorError> {
        if self.readings.is_empty() {
            return Err(SensorError::EmptyScript);
        }
        let readings = Arc::clone(&self.readings);
        let classifier = self.classifier;
        let interval = self.interval;
        let looping = self.looping;

        self.producer.start(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                for reading in readings.iter() {
                    ticker.tick().await;
                    if !sink.send(reading.is_horizontal(&classifier)) {
                        return;
                    }
                }
                if !looping {
                    return;
                }
            }
        })?;
        debug!(
            readings = self.readings.len(),
            interval_ms = self.interval.as_millis() as u64,
            looping = self.looping,
            "scripted sensor subscribed"
        );
        Ok(())
    }

    fn unsubscribe(&mut self) {
        if self.producer.stop() {
            debug!("scripted sensor unsubscribed");
        }
    }

    fn is_subscribed(&self) -> bool {
        self.producer.is_running()
    }
}

/// Reads readings line by line from a blocking reader (stdin by default),
/// delivering each as soon as it arrives. Unreadable lines are skipped.
///
/// The reader runs on its own thread. A blocked read cannot be interrupted,
/// so unsubscribing detaches the thread instead of waiting for it; it exits
/// at its next line once delivery is stopped.
pub struct LineSensor<R> {
    reader: Option<R>,
    classifier: OrientationClassifier,
    worker: Option<LineWorker>,
}

struct LineWorker {
    stop: Arc<AtomicBool>,
    thread: thread::JoinHandle<()>,
}

impl LineSensor<BufReader<io::Stdin>> {
    pub fn stdin(classifier: OrientationClassifier) -> Self {
        Self::new(BufReader::new(io::stdin()), classifier)
    }
}

impl<R> LineSensor<R>
where
    R: BufRead + Send + 'static,
{
    pub fn new(reader: R, classifier: OrientationClassifier) -> Self {
        Self {
            reader: Some(reader),
            classifier,
            worker: None,
        }
    }
}

fn read_lines<R: BufRead>(
    reader: R,
    classifier: OrientationClassifier,
    sink: Outbox<bool>,
    stop: &AtomicBool,
) {
    for (index, line) in reader.lines().enumerate() {
        if stop.load(Ordering::Acquire) {
            return;
        }
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                warn!(error = %err, "sensor input failed");
                return;
            }
        };
        match parse_reading(&line) {
            Ok(Some(reading)) => {
                let horizontal = reading.is_horizontal(&classifier);
                if stop.load(Ordering::Acquire) || !sink.send(horizontal) {
                    return;
                }
            }
            Ok(None) => {}
            Err(reason) => warn!(line = index + 1, %reason, "skipping sensor line"),
        }
    }
}

impl<R> SensorSource for LineSensor<R>
where
    R: BufRead + Send + 'static,
{
    fn subscribe(&mut self, sink: Outbox<bool>) -> Result<(), SensorError> {
        if self.is_subscribed() {
            return Err(SensorError::AlreadySubscribed);
        }
        let reader = self.reader.take().ok_or(SensorError::Exhausted)?;
        let classifier = self.classifier;
        let stop = Arc::new(AtomicBool::new(false));

        let thread = {
            let stop = Arc::clone(&stop);
            thread::Builder::new()
                .name("tiltgun-line-sensor".into())
                .spawn(move || read_lines(reader, classifier, sink, &stop))
                .map_err(SensorError::Spawn)?
        };
        self.worker = Some(LineWorker { stop, thread });
        debug!("line sensor subscribed");
        Ok(())
    }

    fn unsubscribe(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.stop.store(true, Ordering::Release);
            debug!("line sensor unsubscribed");
        }
    }

    fn is_subscribed(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| !worker.thread.is_finished())
    }
}
