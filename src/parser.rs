//! Instance loading. Grounded on `pmp-1.01/main.c`'s `read_file`: accepts
//! either a flat header (`Tiers:`/`Height:`, `Width:`/`Stacks:`,
//! `Containers:`, or a bare `n_stack n_block` line) followed by
//! `n_tier <priorities...>` records, or a `Stack i:` per-line layout.
//! `#` starts a comment that runs to end of line in either format.

use std::collections::BTreeSet;

use fxhash::FxHashMap;

use crate::common::Priority;
use crate::error::ParseError;
use crate::problem::Problem;

/// A loaded instance, already dense-priority-remapped; hand to
/// [`Problem::new`] to build the immutable model the solver consumes.
#[derive(Debug, Clone)]
pub struct ParsedInstance {
    pub s_height: usize,
    pub max_priority: Priority,
    pub duplicate: bool,
    pub blocks: Vec<Vec<Priority>>,
}

impl ParsedInstance {
    pub fn into_problem(self) -> Problem {
        Problem::new(self.s_height, self.max_priority, self.duplicate, self.blocks)
    }
}

/// CLI-supplied overrides, mirroring `-S`/`-T`/`-E`. A header value always
/// widens `n_stack` to the larger of the two (`-S` "prefers the max"),
/// while `s_height`/`n_empty_tier` take the CLI value outright when given.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOverrides {
    pub n_stack: Option<usize>,
    pub s_height: Option<usize>,
    pub n_empty_tier: Option<usize>,
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(i) => &line[..i],
        None => line,
    }
}

pub fn parse(input: &str, overrides: ParseOverrides) -> Result<ParsedInstance, ParseError> {
    let lines: Vec<&str> = input.lines().collect();
    let mut n_stack = overrides.n_stack.unwrap_or(0);
    let mut s_height = overrides.s_height.unwrap_or(0);
    let mut n_block = 0usize;

    let mut idx = 0usize;
    let mut format_b = false;
    let mut saw_colon_header = false;

    while idx < lines.len() {
        let line_no = idx + 1;
        let stripped = strip_comment(lines[idx]);
        let trimmed = stripped.trim();
        if trimmed.is_empty() {
            idx += 1;
            continue;
        }
        if trimmed.starts_with("Stack ") {
            format_b = true;
            break;
        }
        if let Some(colon) = trimmed.find(':') {
            let key = trimmed[..colon].trim();
            let val_str = trimmed[colon + 1..].trim();
            let kind = match key {
                "Tiers" | "Height" => Some(0),
                "Width" | "Stacks" => Some(1),
                "Containers" => Some(2),
                _ => None,
            };
            if let Some(kind) = kind {
                let token = val_str.split_whitespace().next().unwrap_or("0");
                let val: i64 = token.parse().map_err(|source| ParseError::Int { line: line_no, source })?;
                match kind {
                    0 => {
                        s_height = match overrides.n_empty_tier.filter(|&e| e > 0) {
                            Some(e) => val as usize + e,
                            None => val as usize,
                        };
                    }
                    1 => n_stack = n_stack.max(val as usize),
                    _ => n_block = val as usize,
                }
                saw_colon_header = true;
            }
            idx += 1;
            continue;
        }
        // A bare `n_stack s_height` line is only a header when no
        // colon-keyed header has already supplied those dimensions;
        // otherwise this is the first stack's data and parsing falls
        // through to the body reader without consuming it.
        if saw_colon_header {
            break;
        }
        let mut parts = trimmed.split_whitespace();
        if let (Some(a), Some(b)) = (parts.next(), parts.next()) {
            let dn_stack: usize = a.parse().map_err(|source| ParseError::Int { line: line_no, source })?;
            let dn_height: usize = b.parse().map_err(|source| ParseError::Int { line: line_no, source })?;
            n_stack = n_stack.max(dn_stack);
            if s_height == 0 && overrides.n_empty_tier.is_none() {
                s_height = dn_height;
            }
            idx += 1;
        }
        break;
    }

    let raw_blocks = if format_b {
        // A `Stacks:`/`Width:` header is optional in this format: when
        // absent, the number of `Stack i:` lines present determines it.
        let mut blocks = parse_format_b(&lines[idx..])?;
        if n_stack == 0 {
            n_stack = blocks.len();
        }
        blocks.truncate(n_stack);
        while blocks.len() < n_stack {
            blocks.push(Vec::new());
        }
        blocks
    } else {
        if n_stack == 0 {
            return Err(ParseError::Empty);
        }
        parse_format_a(&lines[idx..], n_stack, n_block)?
    };

    if n_stack == 0 {
        return Err(ParseError::Empty);
    }

    if raw_blocks.iter().all(Vec::is_empty) {
        return Err(ParseError::Empty);
    }

    let total: usize = raw_blocks.iter().map(Vec::len).sum();
    if n_block != 0 && n_block != total {
        return Err(ParseError::ContainerCountMismatch {
            declared: n_block,
            parsed: total,
        });
    }

    let observed_height = raw_blocks.iter().map(Vec::len).max().unwrap_or(0);
    if s_height == 0 {
        s_height = observed_height;
    }
    if observed_height > s_height {
        return Err(ParseError::HeightExceeded { height: observed_height });
    }

    let distinct: BTreeSet<i64> = raw_blocks.iter().flatten().copied().collect();
    let rank: FxHashMap<i64, Priority> =
        distinct.iter().enumerate().map(|(r, &v)| (v, r as Priority)).collect();
    let max_priority = distinct.len().saturating_sub(1) as Priority;
    let duplicate = (distinct.len()) < total;

    let blocks: Vec<Vec<Priority>> = raw_blocks
        .into_iter()
        .map(|stack| stack.into_iter().map(|v| rank[&v]).collect())
        .collect();

    Ok(ParsedInstance {
        s_height,
        max_priority,
        duplicate,
        blocks,
    })
}

/// `n_tier <priorities...>` records, as a single flat token stream
/// spanning line breaks — a record's priorities need not fit on the line
/// that opens it, matching the source's continuation behavior.
fn parse_format_a(lines: &[&str], n_stack: usize, n_block: usize) -> Result<Vec<Vec<i64>>, ParseError> {
    let mut tokens = Vec::new();
    for (offset, line) in lines.iter().enumerate() {
        let stripped = strip_comment(line);
        for tok in stripped.split_whitespace() {
            let val: i64 = tok
                .parse()
                .map_err(|source| ParseError::Int { line: offset + 1, source })?;
            tokens.push(val);
        }
    }

    let mut blocks = Vec::with_capacity(n_stack);
    let mut pos = 0usize;
    let mut total = 0usize;
    while blocks.len() < n_stack {
        if n_block > 0 && total >= n_block {
            break;
        }
        let Some(&n_tier) = tokens.get(pos) else { break };
        pos += 1;
        let n_tier = n_tier.max(0) as usize;
        let mut stack = Vec::with_capacity(n_tier);
        for _ in 0..n_tier {
            let Some(&p) = tokens.get(pos) else {
                return Err(ParseError::TierCountMismatch {
                    line: lines.len(),
                    expected: n_tier,
                    found: stack.len(),
                });
            };
            pos += 1;
            stack.push(p);
        }
        total += n_tier;
        blocks.push(stack);
    }
    while blocks.len() < n_stack {
        blocks.push(Vec::new());
    }
    Ok(blocks)
}

/// One stack per `Stack i:` line, all of that stack's priorities on the
/// same line — the source does not continue a stack's tokens onto the
/// next line in this format.
fn parse_format_b(lines: &[&str]) -> Result<Vec<Vec<i64>>, ParseError> {
    let mut blocks = Vec::new();
    for (offset, line) in lines.iter().enumerate() {
        let stripped = strip_comment(line);
        let trimmed = stripped.trim();
        if !trimmed.starts_with("Stack ") {
            continue;
        }
        let rest = &trimmed["Stack ".len()..];
        let rest = match rest.find(':') {
            Some(i) => &rest[i + 1..],
            None => rest,
        };
        let mut stack = Vec::new();
        for tok in rest.split_whitespace() {
            let val: i64 = tok
                .parse()
                .map_err(|source| ParseError::Int { line: offset + 1, source })?;
            stack.push(val);
        }
        blocks.push(stack);
    }
    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_a_header_and_body() {
        let input = "Tiers: 4\nStacks: 3\nContainers: 5\n3 5 2 8\n0\n2 1 1\n";
        let parsed = parse(input, ParseOverrides::default()).unwrap();
        assert_eq!(parsed.s_height, 4);
        assert_eq!(parsed.blocks.len(), 3);
        assert_eq!(parsed.blocks[1].len(), 0);
        assert_eq!(parsed.blocks[2].len(), 2);
    }

    #[test]
    fn format_a_bare_header_line() {
        let input = "3 4\n2 5 2\n1 8\n0\n";
        let parsed = parse(input, ParseOverrides::default()).unwrap();
        assert_eq!(parsed.blocks.len(), 3);
        assert_eq!(parsed.s_height, 4);
    }

    #[test]
    fn format_b_labeled_stacks() {
        let input = "Containers: 4\nStack 0: 5 2\nStack 1: 8\nStack 2:\n";
        let parsed = parse(input, ParseOverrides::default()).unwrap();
        assert_eq!(parsed.blocks.len(), 3);
        assert_eq!(parsed.blocks[0].len(), 2);
        assert_eq!(parsed.blocks[2].len(), 0);
    }

    #[test]
    fn comments_are_stripped() {
        let input = "Stacks: 2\nContainers: 2\n# a leading comment\n1 9 # trailing\n1 9\n";
        let parsed = parse(input, ParseOverrides::default()).unwrap();
        assert_eq!(parsed.blocks.len(), 2);
        // both stacks hold the same raw priority: dense rank collapses it
        // to a single value, and duplicate must be flagged.
        assert!(parsed.duplicate);
        assert_eq!(parsed.max_priority, 0);
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(parse("", ParseOverrides::default()), Err(ParseError::Empty)));
    }

    #[test]
    fn stacks_header_and_override_both_widen_to_the_max() {
        let input = "Tiers: 2\nStacks: 2\nContainers: 1\n1 0\n0\n";

        // override narrower than the header: header wins.
        let overrides = ParseOverrides { n_stack: Some(1), ..Default::default() };
        let parsed = parse(input, overrides).unwrap();
        assert_eq!(parsed.blocks.len(), 2);

        // override wider than the header: override wins, padding with
        // empty stacks.
        let overrides = ParseOverrides { n_stack: Some(4), ..Default::default() };
        let parsed = parse(input, overrides).unwrap();
        assert_eq!(parsed.blocks.len(), 4);
        assert!(parsed.blocks[3].is_empty());
    }
}
