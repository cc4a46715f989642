//! Fixed-position parser for the classic `tc` layout.
//!
//! Lines are split on single spaces, so leading indentation and doubled
//! spaces produce empty tokens and the indices below count them.

use super::{
    ClassRecord, FilterRecord, OutputParser, QdiscRecord, parse_match_port, parse_priority,
    parse_rate,
};
use crate::error::{Error, Result};

const QDISC_KIND: usize = 1;
const QDISC_HANDLE: usize = 2;
const QDISC_POSITION: usize = 3;

const CLASS_ID: usize = 2;
const CLASS_RATE: usize = 7;
const CLASS_CEIL: usize = 9;

const FILTER_PRIO: usize = 6;
const FILTER_KIND: usize = 7;
const MATCH_KEY: usize = 3;

/// Reads values at fixed token indices.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionalParser;

fn tokens(line: &str) -> Vec<&str> {
    line.split(' ').collect()
}

fn token<'a>(toks: &[&'a str], idx: usize, line: &str) -> Result<&'a str> {
    toks.get(idx)
        .copied()
        .ok_or_else(|| Error::Parse(format!("missing field {} in '{}'", idx, line.trim_end())))
}

impl OutputParser for PositionalParser {
    fn name(&self) -> &'static str {
        "positional"
    }

    fn qdiscs(&self, output: &str) -> Result<Vec<QdiscRecord>> {
        let mut records = Vec::new();
        for line in output.lines().filter(|l| l.starts_with("qdisc ")) {
            let toks = tokens(line);
            let kind = token(&toks, QDISC_KIND, line)?;
            let handle = token(&toks, QDISC_HANDLE, line)?;
            let parent = match toks.get(QDISC_POSITION).copied() {
                Some("root") => Some("root".to_string()),
                Some("parent") => toks.get(QDISC_POSITION + 1).map(|p| p.to_string()),
                _ => None,
            };
            records.push(QdiscRecord {
                kind: kind.to_string(),
                handle: handle.to_string(),
                parent,
            });
        }
        Ok(records)
    }

    fn class(&self, output: &str, classid: &str) -> Result<Option<ClassRecord>> {
        let Some(line) = output.lines().find(|line| {
            let toks = tokens(line);
            toks.first() == Some(&"class") && toks.get(CLASS_ID) == Some(&classid)
        }) else {
            return Ok(None);
        };

        let toks = tokens(line);
        let rate = parse_rate(token(&toks, CLASS_RATE, line)?)?;
        let ceil = parse_rate(token(&toks, CLASS_CEIL, line)?)?;
        Ok(Some(ClassRecord {
            classid: classid.to_string(),
            rate,
            ceil,
        }))
    }

    fn u32_filter(
        &self,
        output: &str,
        flowid: &str,
        priority: u32,
    ) -> Result<Option<FilterRecord>> {
        let lines: Vec<&str> = output.lines().collect();

        for (idx, line) in lines.iter().enumerate() {
            let toks = tokens(line);
            if !toks.contains(&flowid) {
                continue;
            }
            if parse_priority(token(&toks, FILTER_PRIO, line)?)? != priority {
                continue;
            }

            let next = lines
                .get(idx + 1)
                .ok_or_else(|| Error::Parse(format!("no match line after '{}'", line.trim_end())))?;
            let port = parse_match_port(token(&tokens(next), MATCH_KEY, next)?)?;

            return Ok(Some(FilterRecord {
                priority,
                port: Some(port),
                handle: None,
            }));
        }
        Ok(None)
    }

    fn cgroup_filter(&self, output: &str, priority: u32) -> Result<Option<FilterRecord>> {
        let mut found = None;
        for line in output.lines().filter(|l| l.starts_with("filter ")) {
            let toks = tokens(line);
            if toks.get(FILTER_KIND) != Some(&"cgroup") {
                continue;
            }
            if parse_priority(token(&toks, FILTER_PRIO, line)?)? != priority {
                continue;
            }
            let handle = toks
                .iter()
                .position(|t| *t == "handle")
                .and_then(|i| toks.get(i + 1))
                .map(|h| h.to_string());
            let record = FilterRecord {
                priority,
                port: None,
                handle,
            };
            // Newer tc prints a bare header line before the one with the handle.
            if record.handle.is_some() {
                return Ok(Some(record));
            }
            found.get_or_insert(record);
        }
        Ok(found)
    }
}
