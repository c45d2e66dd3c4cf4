use ::std::collections::HashMap;

use super::instructions::{Instruction, Label};

/// First instruction in `body` carrying `label`.
pub fn find(label: Label, body: &[Instruction]) -> Option<&Instruction> {
    body.iter().find(|inst| inst.label == label)
}

/// Precomputed label lookup for one instruction list.
///
/// Gives the same answers as [`find`]: when a label is defined twice the earlier
/// instruction wins and the later one is unreachable.
pub struct LabelIndex<'a> {
    body: &'a [Instruction],
    offsets: HashMap<Label, usize>,
}

impl<'a> LabelIndex<'a> {
    pub fn new(body: &'a [Instruction]) -> Self {
        let mut offsets = HashMap::with_capacity(body.len());
        for (offset, inst) in body.iter().enumerate() {
            offsets.entry(inst.label).or_insert(offset);
        }
        LabelIndex { body, offsets }
    }

    pub fn find(&self, label: Label) -> Option<&'a Instruction> {
        self.offsets.get(&label).map(|&offset| &self.body[offset])
    }

    pub fn entry(&self) -> Option<&'a Instruction> {
        self.body.first()
    }

    /// Labels that occur more than once, in order of their second appearance.
    pub fn duplicates(&self) -> Vec<Label> {
        self.body
            .iter()
            .enumerate()
            .filter(|&(offset, inst)| self.offsets[&inst.label] != offset)
            .map(|(_, inst)| inst.label)
            .collect()
    }
}
