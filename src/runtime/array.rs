//! Element storage of script arrays
//!
//! Indices up to `MAX_ARRAY_INDEX` are elements, larger ones are ordinary
//! properties. Elements live in a dense vector while writes stay close to its
//! end and in an ordered sparse tail otherwise, so `length` can take any
//! uint32 value without allocating for the holes.

use std::collections::BTreeMap;

use super::value::ScriptValue;

/// Largest index that is an array element (2^32 - 2)
pub const MAX_ARRAY_INDEX: u32 = u32::MAX - 1;

/// Longest string `join` builds
pub const MAX_JOINED_LENGTH: usize = 1 << 28;

/// Holes a conversion to a host list may fill in
pub const MAX_MATERIALIZED_HOLES: usize = 1 << 16;

/// Writes further than this past the dense end go to the sparse tail
const DENSE_GAP: usize = 1024;

/// Element index spelled canonically: digits without leading zeros, at most `MAX_ARRAY_INDEX`
pub fn parse_index(name: &str) -> Option<u32> {
    if name.is_empty() || (name.len() > 1 && name.starts_with('0')) || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name.parse::<u32>().ok().filter(|&index| index <= MAX_ARRAY_INDEX)
}

pub fn element_index(index: usize) -> Option<u32> {
    u32::try_from(index).ok().filter(|&index| index <= MAX_ARRAY_INDEX)
}

/// The uint32 a length assignment or `new Array(n)` accepts
pub fn to_array_length(n: f64) -> Option<u32> {
    if n >= 0.0 && n.fract() == 0.0 && n <= u32::MAX as f64 {
        Some(n as u32)
    } else {
        None
    }
}

#[derive(Clone, Debug, Default)]
pub struct ArrayElements {
    dense: Vec<ScriptValue>,
    /// Every key is at least `dense.len()` and below `length`
    sparse: BTreeMap<u32, ScriptValue>,
    length: u32,
}

impl ArrayElements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values(mut values: Vec<ScriptValue>) -> Self {
        values.truncate(u32::MAX as usize);
        let length = values.len() as u32;
        Self { dense: values, sparse: BTreeMap::new(), length }
    }

    /// Only holes, nothing allocated
    pub fn with_length(length: u32) -> Self {
        Self { length, ..Self::default() }
    }

    pub fn len(&self) -> u32 {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn get(&self, index: u32) -> Option<&ScriptValue> {
        self.dense.get(index as usize).or_else(|| self.sparse.get(&index))
    }

    pub fn contains(&self, index: u32) -> bool {
        self.get(index).is_some()
    }

    /// Store an element, growing `length` past it; false when `index` is not an element index
    pub fn set(&mut self, index: u32, value: ScriptValue) -> bool {
        if index > MAX_ARRAY_INDEX {
            return false;
        }
        let at = index as usize;
        if at < self.dense.len() {
            self.dense[at] = value;
        } else if at <= self.dense.len() + DENSE_GAP {
            self.sparse.remove(&index);
            self.dense.resize(at, ScriptValue::Undefined);
            self.dense.push(value);
            self.absorb_sparse();
        } else {
            self.sparse.insert(index, value);
        }
        self.length = self.length.max(index + 1);
        true
    }

    /// Append at `length`; false once the array is full
    pub fn push(&mut self, value: ScriptValue) -> bool {
        self.set(self.length, value)
    }

    /// Shrinking drops the elements at and above `length`
    pub fn set_len(&mut self, length: u32) {
        if (length as usize) < self.dense.len() {
            self.dense.truncate(length as usize);
        }
        self.sparse.retain(|&index, _| index < length);
        self.length = length;
    }

    /// Turn an element back into a hole
    pub fn remove(&mut self, index: u32) -> bool {
        match self.dense.get_mut(index as usize) {
            Some(slot) => {
                *slot = ScriptValue::Undefined;
                true
            }
            None => self.sparse.remove(&index).is_some(),
        }
    }

    /// Stored elements in index order
    pub fn iter(&self) -> impl Iterator<Item = (u32, &ScriptValue)> + '_ {
        self.dense
            .iter()
            .enumerate()
            .map(|(index, value)| (index as u32, value))
            .chain(self.sparse.iter().map(|(&index, value)| (index, value)))
    }

    pub fn indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.iter().map(|(index, _)| index)
    }

    /// Holes a dense copy would have to fill in
    pub fn missing(&self) -> usize {
        self.length as usize - self.dense.len() - self.sparse.len()
    }

    /// Dense copy with holes as undefined; `None` beyond `MAX_MATERIALIZED_HOLES`
    pub fn to_dense(&self) -> Option<Vec<ScriptValue>> {
        if self.missing() > MAX_MATERIALIZED_HOLES {
            return None;
        }
        let mut values = self.dense.clone();
        for (&index, value) in &self.sparse {
            values.resize(index as usize, ScriptValue::Undefined);
            values.push(value.clone());
        }
        values.resize(self.length as usize, ScriptValue::Undefined);
        Some(values)
    }

    /// `join` over the whole length, holes and nullish elements rendering empty;
    /// `None` once the result would pass `MAX_JOINED_LENGTH`
    pub fn join_with<F>(&self, separator: &str, mut render: F) -> Option<String>
    where
        F: FnMut(&ScriptValue) -> String,
    {
        let separators = (self.length as usize).saturating_sub(1);
        if separators.checked_mul(separator.len())? > MAX_JOINED_LENGTH {
            return None;
        }
        let mut out = String::new();
        let mut written = 0usize;
        for (index, value) in self.iter() {
            let index = index as usize;
            out.push_str(&separator.repeat(index - written));
            written = index;
            if !value.is_nullish() {
                out.push_str(&render(value));
            }
            if out.len() > MAX_JOINED_LENGTH {
                return None;
            }
        }
        out.push_str(&separator.repeat(separators - written.min(separators)));
        Some(out)
    }

    fn absorb_sparse(&mut self) {
        let tail = self.sparse.split_off(&(self.dense.len() as u32));
        for (index, value) in std::mem::replace(&mut self.sparse, tail) {
            self.dense[index as usize] = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(value: &ScriptValue) -> String {
        value.to_script_string()
    }

    #[test]
    fn test_index_spelling_and_range() {
        assert_eq!(parse_index("0"), Some(0));
        assert_eq!(parse_index("17"), Some(17));
        assert_eq!(parse_index("4294967294"), Some(MAX_ARRAY_INDEX));
        assert_eq!(parse_index("4294967295"), None);
        assert_eq!(parse_index("99999999999"), None);
        assert_eq!(parse_index("017"), None);
        assert_eq!(parse_index("-1"), None);
        assert_eq!(parse_index("1.5"), None);
        assert_eq!(parse_index(""), None);
    }

    #[test]
    fn test_array_length_conversion() {
        assert_eq!(to_array_length(0.0), Some(0));
        assert_eq!(to_array_length(4294967295.0), Some(u32::MAX));
        assert_eq!(to_array_length(4294967296.0), None);
        assert_eq!(to_array_length(1e15), None);
        assert_eq!(to_array_length(-1.0), None);
        assert_eq!(to_array_length(1.5), None);
        assert_eq!(to_array_length(f64::NAN), None);
    }

    #[test]
    fn test_far_writes_stay_sparse() {
        let mut elements = ArrayElements::from_values(vec![1.into()]);
        assert!(elements.set(MAX_ARRAY_INDEX, 2.into()));
        assert_eq!(elements.len(), u32::MAX);
        assert_eq!(elements.indices().collect::<Vec<_>>(), vec![0, MAX_ARRAY_INDEX]);
        assert!(!elements.push(3.into()));
        assert!(elements.to_dense().is_none());

        elements.set_len(10);
        assert_eq!(elements.indices().collect::<Vec<_>>(), vec![0]);
        assert!(elements.get(MAX_ARRAY_INDEX).is_none());
    }

    #[test]
    fn test_dense_growth_absorbs_the_tail() {
        let mut elements = ArrayElements::new();
        assert!(elements.set(5000, "far".into()));
        assert!(elements.set(0, "a".into()));
        for index in 1..=4000 {
            elements.set(index, ScriptValue::Null);
        }
        assert!(elements.set(4500, "mid".into()));
        assert_eq!(elements.get(5000).map(render).as_deref(), Some("far"));
        assert_eq!(elements.len(), 5001);
        assert_eq!(elements.to_dense().map(|v| v.len()), Some(5001));
        assert!(elements.remove(5000));
        assert!(elements.get(5000).map(|v| v.is_undefined()).unwrap_or(true));
    }

    #[test]
    fn test_join_spans_holes() {
        let mut elements = ArrayElements::with_length(3);
        elements.set(1, "x".into());
        assert_eq!(elements.join_with(",", render).as_deref(), Some(",x,"));
        elements.set(5000, 1.into());
        let joined = elements.join_with("", render).unwrap_or_default();
        assert_eq!(joined, "x1");
        assert!(ArrayElements::with_length(u32::MAX).join_with(",", render).is_none());
        assert_eq!(ArrayElements::with_length(u32::MAX).join_with("", render).as_deref(), Some(""));
    }
}
