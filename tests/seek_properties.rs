//! Exhaustive checks of seeking against a brute-force reference over a family of documents.

use transcript_doc::{
    Document, DocumentIter, Paragraph, ParagraphItem, SeekExt, Silence, Source, Word,
    compute_timed, skip_to_time,
};

/// A document whose item durations cycle through a few uneven values, spread over paragraphs
/// of varying length (including empty ones).
fn document(paragraph_lens: &[usize]) -> Document {
    let durations = [0.25, 1.0, 0.5, 2.0, 0.125];
    let mut n = 0;
    let content = paragraph_lens
        .iter()
        .enumerate()
        .map(|(p, &len)| {
            let items = (0..len)
                .map(|_| {
                    let d = durations[n % durations.len()];
                    let start = n as f64;
                    n += 1;
                    if n % 3 == 0 {
                        ParagraphItem::Silence(Silence {
                            source: n % 2,
                            start,
                            end: start + d,
                        })
                    } else {
                        ParagraphItem::Word(Word {
                            word: format!("w{n}"),
                            source: n % 2,
                            start,
                            end: start + d,
                            conf: 1.0,
                        })
                    }
                })
                .collect();
            Paragraph::new(format!("S{}", p % 2), items)
        })
        .collect();

    Document::new(vec![Source::new("a.wav"), Source::new("b.wav")], content)
}

fn layouts() -> Vec<Vec<usize>> {
    vec![
        vec![1],
        vec![5],
        vec![2, 3],
        vec![0, 4, 0, 1],
        vec![3, 3, 3, 3],
        vec![1, 0, 0, 7, 2],
    ]
}

/// Reference answer computed from the fully materialized timeline.
fn expected(starts: &[f64], target: f64) -> Vec<f64> {
    match starts.iter().rposition(|&s| s <= target) {
        Some(idx) if idx + 1 < starts.len() || starts[idx] >= target => starts[idx..].to_vec(),
        Some(_) => Vec::new(),
        None => starts.to_vec(),
    }
}

fn targets(starts: &[f64]) -> Vec<f64> {
    let mut out = vec![-10.0, -0.001, 0.0];
    for &s in starts {
        out.extend([s - 0.01, s, s + 0.01]);
    }
    if let Some(&last) = starts.last() {
        out.extend([last + 0.5, last + 100.0]);
    }
    out
}

#[test]
fn seek_matches_reference_for_every_target() -> anyhow::Result<()> {
    for layout in layouts() {
        let doc = document(&layout);
        doc.validate()?;
        let starts: Vec<f64> = doc.iter().map(|it| it.absolute_start).collect();

        for target in targets(&starts) {
            let got: Vec<f64> = doc.seek(target).map(|it| it.absolute_start).collect();
            assert_eq!(
                got,
                expected(&starts, target),
                "layout {layout:?}, target {target}"
            );
        }
    }
    Ok(())
}

#[test]
fn seek_output_is_a_contiguous_tail_in_order() {
    for layout in layouts() {
        let doc = document(&layout);
        let all: Vec<(usize, usize)> = doc
            .iter()
            .map(|it| (it.paragraph_idx, it.item_idx))
            .collect();
        let starts: Vec<f64> = doc.iter().map(|it| it.absolute_start).collect();

        for target in targets(&starts) {
            let got: Vec<(usize, usize)> = DocumentIter::new(&doc.content)
                .skip_to_time(target)
                .map(|it| (it.paragraph_idx, it.item_idx))
                .collect();
            assert!(all.ends_with(&got), "layout {layout:?}, target {target}");
        }
    }
}

#[test]
fn timeline_is_strictly_increasing_and_matches_iterator() {
    for layout in layouts() {
        let doc = document(&layout);
        let streamed: Vec<f64> = doc.iter().map(|it| it.absolute_start).collect();
        let derived: Vec<f64> = compute_timed(&doc.content)
            .into_iter()
            .flat_map(|p| p.content)
            .map(|t| t.absolute_start)
            .collect();

        assert_eq!(streamed, derived);
        assert!(streamed.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(streamed.first().copied(), Some(0.0));

        let total: f64 = doc.duration();
        let last_end = doc.iter().last().map(|it| it.absolute_end());
        assert_eq!(last_end, Some(total));
    }
}

#[test]
fn seeking_a_timed_tree_matches_seeking_the_stream() {
    let doc = document(&[2, 0, 3]);
    let timed = compute_timed(&doc.content);
    let flat: Vec<_> = timed.iter().flat_map(|p| &p.content).collect();

    let from_tree: Vec<f64> = skip_to_time(1.3, flat)
        .map(|t| t.absolute_start)
        .collect();
    let from_stream: Vec<f64> = doc.seek(1.3).map(|it| it.absolute_start).collect();
    assert_eq!(from_tree, from_stream);
    assert!(!from_tree.is_empty());
}

#[test]
fn scenario_from_evenly_spaced_items() {
    let content = vec![Paragraph::new(
        "",
        (0..5)
            .map(|i| {
                ParagraphItem::Silence(Silence {
                    source: 0,
                    start: i as f64 * 2.0,
                    end: i as f64 * 2.0 + 2.0,
                })
            })
            .collect(),
    )];
    let doc = Document::new(vec![Source::new("a.wav")], content);
    let seek = |t: f64| -> Vec<f64> { doc.seek(t).map(|it| it.absolute_start).collect() };

    assert_eq!(seek(5.0), vec![4.0, 6.0, 8.0]);
    assert_eq!(seek(0.0), vec![0.0, 2.0, 4.0, 6.0, 8.0]);
    assert_eq!(seek(10.0), Vec::<f64>::new());
    assert_eq!(seek(8.0), vec![8.0]);
    assert_eq!(seek(-3.0), vec![0.0, 2.0, 4.0, 6.0, 8.0]);
}
