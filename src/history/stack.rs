use crate::foundation::error::{StudioError, StudioResult};
use crate::foundation::ids::resolve_prefix;
use crate::history::record::OperationRecord;

/// Append-only operation history with a playback cursor.
///
/// `cursor` ranges over `[-1, len - 1]`; `-1` means no operation is applied. Records are
/// addressed by position, never by reference, so truncation and deletion cannot dangle.
#[derive(Clone, Debug)]
pub struct OperationStack {
    records: Vec<OperationRecord>,
    cursor: isize,
}

impl Default for OperationStack {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationStack {
    /// Empty history, cursor at `-1`.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            cursor: -1,
        }
    }

    /// Build from loaded records and an already-validated cursor.
    pub(crate) fn from_parts(records: Vec<OperationRecord>, cursor: isize) -> StudioResult<Self> {
        let out = Self { records, cursor };
        if !out.cursor_in_range(cursor) {
            return Err(StudioError::corrupt(format!(
                "cursor {cursor} outside [-1, {}]",
                out.last_index()
            )));
        }
        Ok(out)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// `true` when the history is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Current `active_op_index`.
    pub fn cursor(&self) -> isize {
        self.cursor
    }

    /// All records in application order.
    pub fn records(&self) -> &[OperationRecord] {
        &self.records
    }

    /// Records with index `<= cursor`, i.e. the ones currently applied.
    pub fn applied(&self) -> &[OperationRecord] {
        let end = usize::try_from(self.cursor + 1).unwrap_or(0);
        &self.records[..end]
    }

    /// The record under the cursor.
    pub fn active(&self) -> Option<&OperationRecord> {
        usize::try_from(self.cursor)
            .ok()
            .and_then(|i| self.records.get(i))
    }

    /// `cursor >= 0`.
    pub fn can_undo(&self) -> bool {
        self.cursor >= 0
    }

    /// `cursor < len - 1`.
    pub fn can_redo(&self) -> bool {
        self.cursor < self.last_index()
    }

    /// Append a record after the cursor.
    ///
    /// Records after the cursor are discarded first and returned so their derived bitmaps can
    /// be released. The cursor ends on the new record.
    pub fn push(&mut self, record: OperationRecord) -> Vec<OperationRecord> {
        let keep = usize::try_from(self.cursor + 1).unwrap_or(0);
        let discarded = self.records.split_off(keep);
        self.records.push(record);
        self.cursor = self.last_index();
        tracing::debug!(
            cursor = self.cursor,
            discarded = discarded.len(),
            "operation appended"
        );
        discarded
    }

    /// Step the cursor back by one.
    pub fn undo(&mut self) -> StudioResult<isize> {
        if !self.can_undo() {
            return Err(StudioError::NothingToUndo);
        }
        self.cursor -= 1;
        tracing::debug!(cursor = self.cursor, "undo");
        Ok(self.cursor)
    }

    /// Step the cursor forward by one.
    pub fn redo(&mut self) -> StudioResult<isize> {
        if !self.can_redo() {
            return Err(StudioError::NothingToRedo);
        }
        self.cursor += 1;
        tracing::debug!(cursor = self.cursor, "redo");
        Ok(self.cursor)
    }

    /// Index of the record matching an exact id or unique prefix.
    pub fn resolve(&self, query: &str) -> StudioResult<usize> {
        resolve_prefix("operation", query, self.records.iter().map(|r| r.id.as_str()))
    }

    /// Remove the record matching `query`, returning its former index and the record.
    pub fn delete(&mut self, query: &str) -> StudioResult<(usize, OperationRecord)> {
        let i = self.resolve(query)?;
        Ok((i, self.remove_at(i)))
    }

    /// Remove every record matching `pred`, adjusting the cursor as for single deletions.
    pub(crate) fn remove_where(
        &mut self,
        mut pred: impl FnMut(&OperationRecord) -> bool,
    ) -> Vec<OperationRecord> {
        let hits: Vec<usize> = (0..self.records.len())
            .filter(|&i| pred(&self.records[i]))
            .collect();
        let mut removed: Vec<OperationRecord> =
            hits.into_iter().rev().map(|i| self.remove_at(i)).collect();
        removed.reverse();
        removed
    }

    /// Drop the whole history; cursor returns to `-1`.
    pub fn clear(&mut self) -> Vec<OperationRecord> {
        self.cursor = -1;
        std::mem::take(&mut self.records)
    }

    // Cursor rule: earlier record -> shift down, active record -> previous one, later -> unchanged.
    fn remove_at(&mut self, i: usize) -> OperationRecord {
        let removed = self.records.remove(i);
        let i = i as isize;
        if i < self.cursor {
            self.cursor -= 1;
        } else if i == self.cursor {
            self.cursor = i - 1;
        }
        tracing::debug!(index = i, cursor = self.cursor, "operation removed");
        removed
    }

    fn last_index(&self) -> isize {
        self.records.len() as isize - 1
    }

    fn cursor_in_range(&self, cursor: isize) -> bool {
        (-1..=self.last_index()).contains(&cursor)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/history/stack.rs"]
mod tests;
