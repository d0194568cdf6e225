use std::any::Any;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use encoding_rs::{Encoding, UTF_8};
use itertools::Itertools;

use crate::api::Solution;
use crate::error::{Result, SlnError};
use crate::raw::{self, LineEnd};
use crate::section::{HandlerId, Section};

/// Renders sections of one handler kind from a value
pub trait ObjHandler {
    /// Text of the whole block or `None` to keep the stored raw text
    fn extract(&self, value: Option<&dyn Any>) -> Option<String>;
}

/// Writer to use for a handler kind and the value to feed it
pub struct HandlerValue {
    pub handler: Box<dyn ObjHandler>,
    pub value: Option<Box<dyn Any>>,
}

impl HandlerValue {
    pub fn new<H: ObjHandler + 'static>(handler: H, value: Option<Box<dyn Any>>) -> Self {
        Self {
            handler: Box::new(handler),
            value,
        }
    }

    pub fn with_value<H: ObjHandler + 'static, T: Any>(handler: H, value: T) -> Self {
        Self::new(handler, Some(Box::new(value)))
    }

    fn extract(&self) -> Option<String> {
        self.handler.extract(self.value.as_deref())
    }
}

/// Writes sections back to a destination it exclusively owns.
///
/// Sections are reproduced from their raw text unless a writer is
/// registered for their handler kind. The destination is flushed and
/// released once, by [`SlnWriter::close`] or on drop.
pub struct SlnWriter<W: Write> {
    dest: Option<W>,
    writers: HashMap<HandlerId, HandlerValue>,
    encoding: &'static Encoding,
    bom: bool,
    bom_written: bool,
}

impl SlnWriter<BufWriter<File>> {
    /// Creates or truncates file at the path specified
    pub fn create<P: AsRef<Path>>(
        path: P,
        writers: HashMap<HandlerId, HandlerValue>,
    ) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file), writers))
    }
}

impl<W: Write> SlnWriter<W> {
    /// UTF-8 writer without byte order mark
    pub fn new(dest: W, writers: HashMap<HandlerId, HandlerValue>) -> Self {
        Self {
            dest: Some(dest),
            writers,
            encoding: UTF_8,
            bom: false,
            bom_written: false,
        }
    }

    /// Writer producing the same encoding and byte order mark as the
    /// solution was read with
    pub fn for_solution(
        dest: W,
        writers: HashMap<HandlerId, HandlerValue>,
        solution: &Solution,
    ) -> Self {
        Self::new(dest, writers).with_encoding(solution.encoding(), solution.has_bom())
    }

    /// Encoding of handler rendered text. Raw lines keep their own encoding.
    #[must_use]
    pub fn with_encoding(mut self, encoding: &'static Encoding, bom: bool) -> Self {
        self.encoding = encoding;
        self.bom = bom;
        self
    }

    #[must_use]
    pub fn writers(&self) -> &HashMap<HandlerId, HandlerValue> {
        &self.writers
    }

    /// Writes every section that isn't ignored or subsumed by a parent
    /// handler. Nothing is written if writers break co-handler rules.
    pub fn write(&mut self, sections: &[Section]) -> Result<()> {
        let sections = sections.to_vec();
        self.validate(&sections)?;
        self.write_bom()?;
        for (s, rendered) in self.writable(&sections) {
            self.emit(s, rendered)?;
        }
        Ok(())
    }

    /// Writes single section
    pub fn write_section(&mut self, section: &Section) -> Result<()> {
        if section.ignore {
            return Ok(());
        }
        let rendered = self.render(section);
        self.emit(section, rendered)
    }

    /// Flushes and releases destination. Subsequent calls do nothing.
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut dest) = self.dest.take() {
            dest.flush()?;
        }
        Ok(())
    }

    /// Releases destination without closing it
    pub fn into_inner(mut self) -> Option<W> {
        if let Some(dest) = self.dest.as_mut() {
            if let Err(e) = dest.flush() {
                tracing::error!(error = %e, "Failed to flush solution writer");
            }
        }
        self.dest.take()
    }

    fn dest(&mut self) -> Result<&mut W> {
        self.dest.as_mut().ok_or(SlnError::Closed)
    }

    fn render(&self, section: &Section) -> Option<String> {
        section
            .handler_id()
            .and_then(|id| self.writers.get(&id))
            .and_then(HandlerValue::extract)
    }

    fn emit(&mut self, section: &Section, rendered: Option<String>) -> Result<()> {
        self.write_bom()?;
        let bytes = match rendered {
            None => {
                let text = format!("{}{}", section.raw.text(), section.eol.as_str());
                raw::encode(&text, section.raw.encoding()).into_owned()
            }
            // block removed by its writer, no terminator either
            Some(block) if block.is_empty() => return Ok(()),
            Some(block) => {
                let sep = match section.eol {
                    LineEnd::None => LineEnd::CrLf.as_str(),
                    eol => eol.as_str(),
                };
                let mut text = block.lines().join(sep);
                text.push_str(section.eol.as_str());
                raw::encode(&text, self.encoding).into_owned()
            }
        };
        self.dest()?.write_all(&bytes)?;
        Ok(())
    }

    fn write_bom(&mut self) -> Result<()> {
        if self.bom && !self.bom_written {
            self.bom_written = true;
            let bom = raw::bom_of(self.encoding);
            self.dest()?.write_all(bom)?;
        }
        Ok(())
    }

    fn validate(&self, sections: &[Section]) -> Result<()> {
        let mut parents: BTreeMap<HandlerId, &[HandlerId]> = BTreeMap::new();
        for h in sections.iter().filter_map(|s| s.handler.as_ref()) {
            if !h.co_handlers().is_empty() {
                parents.entry(h.id()).or_insert_with(|| h.co_handlers());
            }
        }

        for id in self.writers.keys().sorted() {
            if let Some(co_handlers) = parents.get(id) {
                let missing: Vec<HandlerId> = co_handlers
                    .iter()
                    .filter(|c| !self.writers.contains_key(c))
                    .copied()
                    .collect();
                if !missing.is_empty() {
                    return Err(SlnError::CoHandlerMissing {
                        handler: *id,
                        co_handlers: missing,
                    });
                }
            }

            let missing_parents: Vec<HandlerId> = parents
                .iter()
                .filter(|(p, co)| co.contains(id) && !self.writers.contains_key(p))
                .map(|(p, _)| *p)
                .collect();
            if !missing_parents.is_empty() {
                return Err(SlnError::CoHandlerParentRequired {
                    handler: *id,
                    parents: missing_parents,
                });
            }
        }
        Ok(())
    }

    /// Sections to write with their rendered text. Only a block actually
    /// rendered by its writer suppresses the rest of its kind and of its
    /// co-handlers.
    fn writable<'s>(&self, sections: &'s [Section]) -> Vec<(&'s Section, Option<String>)> {
        let mut seen = HashSet::new();
        let mut result = Vec::with_capacity(sections.len());
        for s in sections.iter().filter(|s| !s.ignore) {
            let Some(h) = s.handler.as_ref() else {
                result.push((s, None));
                continue;
            };
            if seen.contains(&h.id()) {
                continue;
            }
            let rendered = self.render(s);
            if rendered.is_some() {
                seen.insert(h.id());
                seen.extend(h.co_handlers().iter().copied());
            }
            result.push((s, rendered));
        }
        result
    }
}

impl<W: Write> Drop for SlnWriter<W> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::error!(error = %e, "Failed to close solution writer");
        }
    }
}
