use crate::pipeline::error::StationError;
use crate::pipeline::station::Station;
use crate::pipeline::types::ClipText;
use crossbeam_channel::Sender;

/// Pluggable output for recognized clips.
pub trait TextSink: Send + 'static {
    /// Called for each clip the pipeline recognized.
    fn handle(&mut self, text: &ClipText) -> crate::error::Result<()>;

    /// Called on pipeline shutdown. Return accumulated text if applicable.
    fn finish(&mut self) -> Option<String> {
        None
    }

    /// Name for logging/debugging.
    fn name(&self) -> &'static str {
        "sink"
    }
}

/// Terminal station: hands every clip to a [`TextSink`] and reports
/// the sink's `finish` result when the pipeline drains.
pub(crate) struct SinkStation {
    sink: Box<dyn TextSink>,
    result_tx: Option<Sender<SinkReport>>,
    handled: Vec<ClipText>,
}

/// What reached the sink.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SinkReport {
    pub clips: Vec<ClipText>,
    pub finished: Option<String>,
}

impl SinkStation {
    pub(crate) fn new(sink: Box<dyn TextSink>, result_tx: Sender<SinkReport>) -> Self {
        Self {
            sink,
            result_tx: Some(result_tx),
            handled: Vec::new(),
        }
    }
}

impl Station for SinkStation {
    type Input = ClipText;
    type Output = ();

    fn name(&self) -> &'static str {
        self.sink.name()
    }

    fn process(&mut self, text: ClipText) -> Result<Option<()>, StationError> {
        self.sink
            .handle(&text)
            .map_err(|e| StationError::Recoverable(format!("{}: {e}", text.clip_id)))?;
        self.handled.push(text);
        Ok(None)
    }

    fn shutdown(&mut self) {
        let report = SinkReport {
            clips: std::mem::take(&mut self.handled),
            finished: self.sink.finish(),
        };
        if let Some(tx) = self.result_tx.take()
            && tx.send(report).is_err()
        {
            tracing::debug!("pipeline result receiver already gone");
        }
    }
}

/// Collects recognized sentences, one line per clip.
#[derive(Debug, Default)]
pub struct CollectorSink {
    collected: Vec<String>,
}

impl CollectorSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TextSink for CollectorSink {
    fn handle(&mut self, text: &ClipText) -> crate::error::Result<()> {
        self.collected.push(text.text.clone());
        Ok(())
    }

    fn finish(&mut self) -> Option<String> {
        if self.collected.is_empty() {
            None
        } else {
            Some(self.collected.join("\n"))
        }
    }

    fn name(&self) -> &'static str {
        "collector"
    }
}

/// Writes each sentence to stdout, prefixed by the clip id when asked.
#[derive(Debug, Default)]
pub struct StdoutSink {
    show_ids: bool,
}

impl StdoutSink {
    pub fn new(show_ids: bool) -> Self {
        Self { show_ids }
    }
}

/// Plain `clip<TAB>text` (or just `text`) line for a recognized clip.
pub fn format_line(text: &ClipText, show_id: bool) -> String {
    if show_id {
        format!("{}\t{}", text.clip_id, text.text)
    } else {
        text.text.clone()
    }
}

impl TextSink for StdoutSink {
    fn handle(&mut self, text: &ClipText) -> crate::error::Result<()> {
        println!("{}", format_line(text, self.show_ids));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "stdout"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    #[test]
    fn text_sink_is_object_safe() {
        let _sink: Box<dyn TextSink> = Box::new(CollectorSink::new());
    }

    #[test]
    fn collector_joins_lines() {
        let mut sink = CollectorSink::new();
        sink.handle(&ClipText::new("a", "bin blue", 0.9)).unwrap();
        sink.handle(&ClipText::new("b", "set red", 0.8)).unwrap();
        assert_eq!(sink.finish(), Some("bin blue\nset red".to_string()));
    }

    #[test]
    fn collector_empty_returns_none() {
        assert_eq!(CollectorSink::new().finish(), None);
    }

    #[test]
    fn line_format() {
        let text = ClipText::new("s1/bbaf2n", "bin blue", 0.9);
        assert_eq!(format_line(&text, true), "s1/bbaf2n\tbin blue");
        assert_eq!(format_line(&text, false), "bin blue");
    }

    #[test]
    fn sink_station_reports_on_shutdown() {
        let (tx, rx) = bounded(1);
        let mut station = SinkStation::new(Box::new(CollectorSink::new()), tx);
        station.process(ClipText::new("a", "first", 0.5)).unwrap();
        station.process(ClipText::new("b", "second", 0.5)).unwrap();
        station.shutdown();

        let report = rx.recv().unwrap();
        assert_eq!(report.clips.len(), 2);
        assert_eq!(report.clips[1].clip_id, "b");
        assert_eq!(report.finished, Some("first\nsecond".to_string()));
    }

    #[test]
    fn failing_sink_is_recoverable() {
        struct Broken;
        impl TextSink for Broken {
            fn handle(&mut self, _text: &ClipText) -> crate::error::Result<()> {
                Err(crate::error::LipreadError::Other("disk full".into()))
            }
        }
        let (tx, _rx) = bounded(1);
        let mut station = SinkStation::new(Box::new(Broken), tx);
        let err = station.process(ClipText::new("a", "x", 0.5)).unwrap_err();
        assert!(matches!(err, StationError::Recoverable(_)));
    }
}
