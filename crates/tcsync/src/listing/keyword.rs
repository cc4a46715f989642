//! Keyword-driven parser.
//!
//! Each value is read from the token after its keyword (`rate`, `ceil`,
//! `pref`, `flowid`, `handle`), so extra or reordered columns do not matter.

use super::{
    ClassRecord, FilterRecord, OutputParser, QdiscRecord, parse_match_port, parse_priority,
    parse_rate,
};
use crate::error::{Error, Result};

/// Reads values by the keyword that precedes them.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordParser;

/// The token following `key`, if any.
fn value_after<'a>(toks: &[&'a str], key: &str) -> Option<&'a str> {
    toks.iter()
        .position(|t| *t == key)
        .and_then(|i| toks.get(i + 1))
        .copied()
}

fn require<'a>(toks: &[&'a str], key: &str, line: &str) -> Result<&'a str> {
    value_after(toks, key)
        .ok_or_else(|| Error::Parse(format!("no '{}' in '{}'", key, line.trim())))
}

impl OutputParser for KeywordParser {
    fn name(&self) -> &'static str {
        "keyword"
    }

    fn qdiscs(&self, output: &str) -> Result<Vec<QdiscRecord>> {
        let mut records = Vec::new();
        for line in output.lines() {
            let toks: Vec<&str> = line.split_whitespace().collect();
            let [first, kind, handle, rest @ ..] = toks.as_slice() else {
                continue;
            };
            if *first != "qdisc" {
                continue;
            }
            let parent = if rest.contains(&"root") {
                Some("root".to_string())
            } else {
                value_after(rest, "parent").map(str::to_string)
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
        for line in output.lines() {
            let toks: Vec<&str> = line.split_whitespace().collect();
            if toks.first() != Some(&"class") || toks.get(2) != Some(&classid) {
                continue;
            }
            let rate = parse_rate(require(&toks, "rate", line)?)?;
            let ceil = parse_rate(require(&toks, "ceil", line)?)?;
            return Ok(Some(ClassRecord {
                classid: classid.to_string(),
                rate,
                ceil,
            }));
        }
        Ok(None)
    }

    fn u32_filter(
        &self,
        output: &str,
        flowid: &str,
        priority: u32,
    ) -> Result<Option<FilterRecord>> {
        let lines: Vec<&str> = output.lines().collect();

        for (idx, line) in lines.iter().enumerate() {
            let toks: Vec<&str> = line.split_whitespace().collect();
            if value_after(&toks, "flowid") != Some(flowid) {
                continue;
            }
            if parse_priority(require(&toks, "pref", line)?)? != priority {
                continue;
            }

            // The match key is on the next "match" line before the next filter.
            let key = lines[idx + 1..]
                .iter()
                .map(|l| l.split_whitespace().collect::<Vec<_>>())
                .take_while(|t| t.first() != Some(&"filter"))
                .find_map(|t| match t.as_slice() {
                    ["match", key, ..] => Some(key.to_string()),
                    _ => None,
                })
                .ok_or_else(|| Error::Parse(format!("no match line after '{}'", line.trim())))?;

            return Ok(Some(FilterRecord {
                priority,
                port: Some(parse_match_port(&key)?),
                handle: None,
            }));
        }
        Ok(None)
    }

    fn cgroup_filter(&self, output: &str, priority: u32) -> Result<Option<FilterRecord>> {
        let mut found = None;
        for line in output.lines() {
            let toks: Vec<&str> = line.split_whitespace().collect();
            if toks.first() != Some(&"filter") || !toks.contains(&"cgroup") {
                continue;
            }
            if parse_priority(require(&toks, "pref", line)?)? != priority {
                continue;
            }
            let record = FilterRecord {
                priority,
                port: None,
                handle: value_after(&toks, "handle").map(str::to_string),
            };
            if record.handle.is_some() {
                return Ok(Some(record));
            }
            found.get_or_insert(record);
        }
        Ok(found)
    }
}
