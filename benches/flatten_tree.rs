//! Flattens a paper with a thousand questions in pre-order.

#![allow(missing_docs)]

use std::num::NonZeroUsize;

use criterion::{Criterion, criterion_group, criterion_main};
use exam_archive::{IndexType, QuestionTree};
use uuid::Uuid;

fn pos(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).unwrap()
}

/// Ten questions, each with ten alpha parts, each with ten roman subparts.
fn preseed_tree() -> (QuestionTree, Uuid) {
    let mut tree = QuestionTree::with_capacity(1110);
    let paper = Uuid::new_v4();
    for i in 1..=10 {
        let question = tree.new_question(paper, pos(i), None, None).unwrap();
        for j in 1..=10 {
            let part = tree
                .new_question(paper, pos(j), Some(IndexType::Alpha), Some(question))
                .unwrap();
            for k in 1..=10 {
                tree.new_question(paper, pos(k), Some(IndexType::Roman), Some(part))
                    .unwrap();
            }
        }
    }
    (tree, paper)
}

fn flatten_paper(c: &mut Criterion) {
    let (tree, paper) = preseed_tree();
    c.bench_function("flatten paper", |b| {
        b.iter(|| tree.flatten_paper(std::hint::black_box(paper)).len());
    });
}

criterion_group!(benches, flatten_paper);
criterion_main!(benches);
