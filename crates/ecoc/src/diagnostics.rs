//! Ariadne-based diagnostic rendering for the CLI's own error surface
//! (lex errors and recognizer rejections). Colorless output, matching the
//! rest of the corpus's convention of stable, snapshot-friendly text.

use std::ops::Range;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use eco_common::LexError;

fn clamp(source_len: usize, r: Range<usize>) -> Range<usize> {
    let s = r.start.min(source_len);
    let e = r.end.min(source_len).max(s);
    if s == e {
        s..e.saturating_add(1).min(source_len.max(1))
    } else {
        s..e
    }
}

pub fn render_lex_error(error: &LexError, source: &str) -> String {
    let config = Config::default().with_color(false);
    let at = error.at as usize;
    let span = clamp(source.len(), at..at + 1);

    let report = Report::build(ReportKind::Error, span.clone())
        .with_code("E-LEX")
        .with_message(error.to_string())
        .with_config(config)
        .with_label(
            Label::new(span)
                .with_message(format!("salvaged text: {:?}", error.salvaged))
                .with_color(Color::Red),
        )
        .finish();

    let mut buf = Vec::new();
    report.write(Source::from(source), &mut buf).expect("failed to write diagnostic");
    String::from_utf8(buf).expect("ariadne output is valid utf-8")
}

pub fn render_recognizer_rejection(source: &str, detail: &str) -> String {
    let config = Config::default().with_color(false);
    let len = source.len().max(1);
    let span = 0..len;

    let report = Report::build(ReportKind::Error, span.clone())
        .with_code("E-PARSE")
        .with_message("recognizer did not accept the input")
        .with_config(config)
        .with_label(Label::new(span).with_message(detail.to_string()).with_color(Color::Red))
        .finish();

    let mut buf = Vec::new();
    report.write(Source::from(source), &mut buf).expect("failed to write diagnostic");
    String::from_utf8(buf).expect("ariadne output is valid utf-8")
}
