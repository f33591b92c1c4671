use std::{
    cell::RefCell,
    io,
    rc::Rc,
    sync::{Arc, Mutex},
};

use pipebench::{
    Error, Invocation, Label, Output, Pipeline, Preset, Provider, Result, Runner, Task, TaskKind,
    TranslateOptions, SAMPLE_SENTENCES,
};
use tracing::Level;

#[derive(Debug, Clone, PartialEq)]
struct Call {
    kind: TaskKind,
    input: String,
    invocation: Invocation,
}

type Calls = Rc<RefCell<Vec<Call>>>;

struct Recording {
    kind: TaskKind,
    calls: Calls,
    fail_at: Option<usize>,
}

impl Pipeline for Recording {
    fn run(&mut self, input: &str, invocation: &Invocation) -> Result<Output> {
        let mut calls = self.calls.borrow_mut();
        if self.fail_at == Some(calls.iter().filter(|call| call.kind == self.kind).count()) {
            return Err(Error::Io(io::Error::new(io::ErrorKind::InvalidData, "malformed input")));
        }
        calls.push(Call {
            kind: self.kind,
            input: input.to_owned(),
            invocation: invocation.clone(),
        });

        Ok(match self.kind {
            TaskKind::Translation => Output::Translation(format!("translated: {input}")),
            _ => Output::Labels(vec![Label {
                label: "LABEL_7".to_owned(),
                score: 0.75,
            }]),
        })
    }
}

#[derive(Default)]
struct RecordingProvider {
    calls: Calls,
    models: Vec<String>,
    fail_inference: Option<(TaskKind, usize)>,
}

impl Provider for RecordingProvider {
    fn acquire(&mut self, task: &Task) -> Result<Box<dyn Pipeline>> {
        self.models.push(task.model.clone());
        let fail_at = self
            .fail_inference
            .filter(|(kind, _)| *kind == task.kind)
            .map(|(_, at)| at);

        Ok(Box::new(Recording {
            kind: task.kind,
            calls: Rc::clone(&self.calls),
            fail_at,
        }))
    }
}

fn bench(preset: &Preset, provider: RecordingProvider) -> (Result<()>, RecordingProvider, String) {
    let mut runner = Runner::new(provider, Vec::new());
    let result = runner.run(preset, &SAMPLE_SENTENCES);
    let (provider, out) = runner.into_inner();
    (result, provider, String::from_utf8(out).unwrap())
}

#[test]
fn heavy_run_prints_six_timings_and_no_results() {
    let (result, provider, out) = bench(&Preset::heavy(), RecordingProvider::default());
    result.unwrap();

    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 6);
    for (line, task) in lines.chunks(2).zip(["Sentiment Analysis", "Language Classification", "Translation"]) {
        assert!(line[0].starts_with(&format!("{task} Heavy model loading time: ")));
        assert!(line[1].starts_with(&format!("{task} Heavy pipeline time: ")));
    }

    for sentence in SAMPLE_SENTENCES {
        assert!(!out.contains(sentence));
    }
    assert!(!out.contains("translated"));
    assert!(!out.contains("LABEL_7"));

    assert_eq!(
        provider.models,
        [
            "cardiffnlp/twitter-roberta-base-sentiment",
            "papluca/xlm-roberta-base-language-detection",
            "facebook/nllb-200-distilled-600M",
        ]
    );
}

#[test]
fn each_routine_sees_every_sample_in_order() {
    let (result, provider, _) = bench(&Preset::light(), RecordingProvider::default());
    result.unwrap();

    let calls = provider.calls.borrow();
    assert_eq!(calls.len(), 3 * SAMPLE_SENTENCES.len());
    for (routine, kind) in calls
        .chunks(SAMPLE_SENTENCES.len())
        .zip([TaskKind::Sentiment, TaskKind::LanguageId, TaskKind::Translation])
    {
        let inputs: Vec<&str> = routine.iter().map(|call| call.input.as_str()).collect();
        assert_eq!(inputs, SAMPLE_SENTENCES);
        assert!(routine.iter().all(|call| call.kind == kind));
    }
}

#[test]
fn heavy_translation_requests_hindi_to_english() {
    let (result, provider, _) = bench(&Preset::heavy(), RecordingProvider::default());
    result.unwrap();

    let expected = Invocation::Translate(TranslateOptions {
        src_lang: Some("hin_Deva".to_owned()),
        tgt_lang: Some("eng_Latn".to_owned()),
        max_length: Some(128),
    });
    let calls = provider.calls.borrow();
    let translations: Vec<&Call> = calls.iter().filter(|call| call.kind == TaskKind::Translation).collect();
    assert_eq!(translations.len(), SAMPLE_SENTENCES.len());
    assert!(translations.iter().all(|call| call.invocation == expected));
}

#[test]
fn light_translation_requests_no_language_pair() {
    let (result, provider, _) = bench(&Preset::light(), RecordingProvider::default());
    result.unwrap();

    let calls = provider.calls.borrow();
    for call in calls.iter().filter(|call| call.kind == TaskKind::Translation) {
        let Invocation::Translate(options) = &call.invocation else {
            panic!("translation routine sent {:?}", call.invocation);
        };
        assert_eq!(options.src_lang, None);
        assert_eq!(options.tgt_lang, None);
    }
}

#[test]
fn inference_failure_aborts_remaining_routines() {
    let provider = RecordingProvider {
        fail_inference: Some((TaskKind::LanguageId, 2)),
        ..RecordingProvider::default()
    };
    let (result, provider, out) = bench(&Preset::light(), provider);
    assert!(result.is_err());

    // sentiment finished, language-id loaded then failed on its third input
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[2].starts_with("Language Classification Light model loading time: "));
    assert_eq!(provider.models.len(), 2);
    assert!(provider.calls.borrow().iter().all(|call| call.kind != TaskKind::Translation));
}

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn logged_labels(preset: &Preset) -> Vec<String> {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        bench(preset, RecordingProvider::default()).0.unwrap();
    });

    let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
    logs.lines()
        .filter_map(|line| line.split_once(" label=").map(|(_, rest)| rest))
        .map(|rest| {
            let value = rest.split_whitespace().next().unwrap_or_default();
            value.trim_matches('"').to_owned()
        })
        .collect()
}

#[test]
fn light_language_id_remaps_labels() {
    // sentiment keeps the raw code, language-id reports the readable one
    let labels = logged_labels(&Preset::light());
    assert_eq!(labels.len(), 2 * SAMPLE_SENTENCES.len());
    assert!(labels[..SAMPLE_SENTENCES.len()].iter().all(|label| label == "LABEL_7"));
    assert!(labels[SAMPLE_SENTENCES.len()..].iter().all(|label| label == "hi"));
}

#[test]
fn heavy_language_id_keeps_raw_labels() {
    let labels = logged_labels(&Preset::heavy());
    assert_eq!(labels.len(), 2 * SAMPLE_SENTENCES.len());
    assert!(labels.iter().all(|label| label == "LABEL_7"));
}
