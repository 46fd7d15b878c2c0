//! End-to-end tests of the pipeline, including its failure paths.

use async_trait::async_trait;
use std::io::{self, Cursor};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, BufReader, ReadBuf};
use tokio_util::sync::CancellationToken;
use wcpipe::sink::{OutputFormat, ReportSink, Sink};
use wcpipe::standalone::engine::count_words;
use wcpipe::{Pipeline, PipelineConfig, PipelineError, Record};

fn cursor(text: &str) -> Cursor<Vec<u8>> {
    Cursor::new(text.as_bytes().to_vec())
}

async fn count(text: &str) -> Vec<Record> {
    Pipeline::new(PipelineConfig::new(2, 4))
        .run(vec![cursor(text)], Vec::new(), &CancellationToken::new())
        .await
        .unwrap()
}

/// Repeats one line forever.
struct Endless {
    pos: usize,
}

const LINE: &[u8] = b"the quick brown fox jumps over the lazy dog\n";

impl AsyncRead for Endless {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        while buf.remaining() > 0 {
            let rest = &LINE[self.pos..];
            let n = rest.len().min(buf.remaining());
            buf.put_slice(&rest[..n]);
            self.pos = (self.pos + n) % LINE.len();
        }
        Poll::Ready(Ok(()))
    }
}

/// Yields some text, then fails.
struct Flaky {
    served: bool,
}

impl AsyncRead for Flaky {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if self.served {
            return Poll::Ready(Err(io::Error::new(io::ErrorKind::ConnectionReset, "gone")));
        }
        self.served = true;
        buf.put_slice(b"first line\nsecond ");
        Poll::Ready(Ok(()))
    }
}

/// Accepts a few records, then refuses.
struct FullDisk {
    room: usize,
}

#[async_trait]
impl Sink for FullDisk {
    async fn accept(&mut self, _record: Record) -> io::Result<()> {
        if self.room == 0 {
            return Err(io::Error::other("no space"));
        }
        self.room -= 1;
        Ok(())
    }
}

/// Keeps what it accepts where the test can still see it after a failed run.
#[derive(Clone, Default, Debug)]
struct Shared(Arc<Mutex<Vec<Record>>>);

impl Shared {
    fn records(&self) -> Vec<Record> {
        self.0.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sink for Shared {
    async fn accept(&mut self, record: Record) -> io::Result<()> {
        self.0.lock().unwrap().push(record);
        Ok(())
    }
}

#[tokio::test]
async fn counts_the_example() {
    let out = count("The cat sat.\nThe dog sat on the cat.\n").await;
    assert_eq!(
        out,
        vec![
            Record::new("cat", 2),
            Record::new("dog", 1),
            Record::new("on", 1),
            Record::new("sat", 2),
            Record::new("the", 3),
        ]
    );
}

#[tokio::test]
async fn empty_input_yields_nothing() {
    assert!(count("").await.is_empty());
    assert!(count("123 !!! --\n\n").await.is_empty());
}

#[tokio::test]
async fn several_readers_count_as_one_input() {
    let out = Pipeline::new(PipelineConfig::default())
        .run(
            vec![cursor("alpha beta"), cursor("beta gamma\n"), cursor("")],
            Vec::new(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(
        out,
        vec![
            Record::new("alpha", 1),
            Record::new("beta", 2),
            Record::new("gamma", 1),
        ]
    );
}

#[tokio::test]
async fn agrees_with_the_batch_engine() {
    let text = "It was the best of times, it was the worst of times,\n\
                it was the age of wisdom, it was the age of foolishness...\n\
                IT WAS 1859; 'twas long ago.";
    assert_eq!(count(text).await, count_words(text.lines(), 5));
}

#[tokio::test]
async fn reruns_are_identical() {
    let text = "b a c\na c b\nc\n";
    let first = count(text).await;
    for _ in 0..5 {
        assert_eq!(count(text).await, first);
    }
}

#[tokio::test]
async fn writes_the_fixed_width_report() {
    let sink = ReportSink::new(Vec::<u8>::new(), OutputFormat::Table);
    let sink = Pipeline::new(PipelineConfig::default())
        .run(
            vec![cursor("The cat sat.\nThe dog sat on the cat.\n")],
            sink,
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    let report = String::from_utf8(sink.into_inner()).unwrap();
    assert_eq!(
        report,
        format!(
            "{:<15}{:>4}\n{:<15}{:>4}\n{:<15}{:>4}\n{:<15}{:>4}\n{:<15}{:>4}\n",
            "cat", 2, "dog", 1, "on", 1, "sat", 2, "the", 3
        )
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancellation_mid_drain_stops_every_stage() {
    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    // The input never ends, so only cancellation can release the sorter.
    let source = BufReader::new(Endless { pos: 0 });
    let outcome = tokio::time::timeout(
        Duration::from_secs(10),
        Pipeline::new(PipelineConfig::new(2, 16)).run(vec![source], Vec::new(), &cancel),
    )
    .await
    .expect("pipeline hung after cancellation");

    assert!(outcome.unwrap_err().is_cancelled());
}

#[tokio::test]
async fn read_errors_win_over_the_cancellations_they_cause() {
    let source = BufReader::new(Flaky { served: false });
    let err = Pipeline::new(PipelineConfig::default())
        .run(vec![source], Vec::new(), &CancellationToken::new())
        .await
        .unwrap_err();
    match err {
        PipelineError::Read(err) => assert_eq!(err.kind(), io::ErrorKind::ConnectionReset),
        other => panic!("expected a read error, got {other}"),
    }
}

#[tokio::test]
async fn write_errors_fail_the_run() {
    let err = Pipeline::new(PipelineConfig::default())
        .run(
            vec![cursor("one two three four five")],
            FullDisk { room: 2 },
            &CancellationToken::new(),
        )
        .await
        .err()
        .expect("sink failure must fail the run");
    assert!(matches!(err, PipelineError::Write(_)));
}

fn explode(_line: &str) -> Vec<Record> {
    panic!("map function failed")
}

#[tokio::test]
async fn a_panicking_stage_fails_the_run() {
    let err = Pipeline::new(PipelineConfig::default())
        .with_map_fn(explode)
        .run(vec![cursor("anything\n")], Vec::new(), &CancellationToken::new())
        .await
        .unwrap_err();
    match err {
        PipelineError::Stage { stage, .. } => assert_eq!(stage, "mapper"),
        other => panic!("expected a stage failure, got {other}"),
    }
}

#[tokio::test]
async fn caller_token_survives_internal_failures() {
    let cancel = CancellationToken::new();
    let _ = Pipeline::new(PipelineConfig::default())
        .run(vec![BufReader::new(Flaky { served: false })], Vec::new(), &cancel)
        .await;
    assert!(!cancel.is_cancelled());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn a_failed_read_never_reaches_the_sink() {
    for _ in 0..50 {
        let sink = Shared::default();
        let err = Pipeline::new(PipelineConfig::new(4, 1))
            .run(
                vec![BufReader::new(Flaky { served: false })],
                sink.clone(),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Read(_)));
        assert!(sink.records().is_empty());
    }
}

fn explode_on_stop(line: &str) -> Vec<Record> {
    if line == "stop" {
        panic!("map function failed");
    }
    wcpipe::workload::wc::map(line)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn a_panicking_mapper_never_reaches_the_sink() {
    for _ in 0..50 {
        let sink = Shared::default();
        let err = Pipeline::new(PipelineConfig::new(4, 1))
            .with_map_fn(explode_on_stop)
            .run(
                vec![cursor("alpha beta\ngamma\nstop\n")],
                sink.clone(),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Stage { stage: "mapper", .. }));
        assert!(sink.records().is_empty());
    }
}
