//! Endpoint stitching for way fragments. Used both for route lines and for
//! multipolygon ring assembly.

use std::collections::VecDeque;

use crate::element::OsmId;

enum Fit {
    AppendForward,
    AppendReversed,
    PrependForward,
    PrependReversed,
}

/// Joins way fragments into maximal chains by matching endpoint node ids.
/// Fragments are consumed whole and reversed when needed; a chain is closed
/// once its first and last ids match. Fragments that fit nowhere start
/// chains of their own, so dangling input degrades to open chains instead
/// of being dropped.
pub(crate) fn join_ways(ways: Vec<Vec<OsmId>>) -> Vec<Vec<OsmId>> {
    let mut joined = Vec::new();
    let mut pending: VecDeque<Vec<OsmId>> = ways.into();

    while let Some(mut current) = pending.pop_back() {
        while !pending.is_empty() && !is_closed(&current) {
            let mut found = None;
            for (index, candidate) in pending.iter().enumerate() {
                if let Some(fit) = fit_of(&current, candidate) {
                    found = Some((index, fit));
                    break;
                }
            }
            let (index, fit) = match found {
                Some(found) => found,
                None => break,
            };
            if let Some(segment) = pending.remove(index) {
                attach(&mut current, segment, fit);
            }
        }
        joined.push(current);
    }

    joined
}

pub(crate) fn is_closed(chain: &[OsmId]) -> bool {
    match (chain.first(), chain.last()) {
        (Some(first), Some(last)) => first == last,
        _ => false,
    }
}

fn fit_of(current: &[OsmId], candidate: &[OsmId]) -> Option<Fit> {
    let first = current.first()?;
    let last = current.last()?;
    let candidate_first = candidate.first()?;
    let candidate_last = candidate.last()?;
    if last == candidate_first {
        Some(Fit::AppendForward)
    } else if last == candidate_last {
        Some(Fit::AppendReversed)
    } else if first == candidate_last {
        Some(Fit::PrependForward)
    } else if first == candidate_first {
        Some(Fit::PrependReversed)
    } else {
        None
    }
}

fn attach(current: &mut Vec<OsmId>, mut segment: Vec<OsmId>, fit: Fit) {
    match fit {
        Fit::AppendForward => {
            current.extend(segment.into_iter().skip(1));
        }
        Fit::AppendReversed => {
            segment.pop();
            current.extend(segment.into_iter().rev());
        }
        Fit::PrependForward => {
            segment.pop();
            segment.extend(std::mem::take(current));
            *current = segment;
        }
        Fit::PrependReversed => {
            segment.reverse();
            segment.pop();
            segment.extend(std::mem::take(current));
            *current = segment;
        }
    }
}

#[cfg(test)]
fn ids(values: &[i64]) -> Vec<OsmId> {
    values.iter().map(|v| OsmId::Int(*v)).collect()
}

#[test]
fn fragments_stitch_into_a_closed_ring() {
    let joined = join_ways(vec![ids(&[1, 2, 3]), ids(&[5, 6, 1]), ids(&[3, 4, 5])]);
    assert_eq!(joined.len(), 1);
    assert!(is_closed(&joined[0]));
    assert_eq!(joined[0].len(), 7);
}

#[test]
fn reversed_fragments_are_flipped_to_fit() {
    let joined = join_ways(vec![ids(&[1, 2, 3]), ids(&[1, 5, 4]), ids(&[3, 4])]);
    assert_eq!(joined.len(), 1);
    assert_eq!(joined[0], ids(&[1, 2, 3, 4, 5, 1]));
}

#[test]
fn fragments_can_prepend_to_the_chain() {
    let joined = join_ways(vec![ids(&[3, 4]), ids(&[1, 2]), ids(&[2, 3])]);
    assert_eq!(joined.len(), 1);
    assert!(joined[0] == ids(&[1, 2, 3, 4]) || joined[0] == ids(&[4, 3, 2, 1]));
}

#[test]
fn unconnected_fragments_stay_separate() {
    let joined = join_ways(vec![ids(&[1, 2]), ids(&[10, 11])]);
    assert_eq!(joined.len(), 2);
}

#[test]
fn closed_fragments_are_kept_as_is() {
    let ring = ids(&[1, 2, 3, 1]);
    let joined = join_ways(vec![ring.clone(), ids(&[7, 8])]);
    assert_eq!(joined.len(), 2);
    assert!(joined.contains(&ring));
}

#[test]
fn empty_input_yields_no_chains() {
    assert!(join_ways(Vec::new()).is_empty());
}
