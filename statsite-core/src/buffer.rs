use crate::sample::Sample;

/// An ordered, append-only collection of [`Sample`]s bound to one flush
/// window.
///
/// Created empty when the previous buffer is frozen at a tick; mutated
/// only by ingest, via [`Buffer::push`]; consumed exactly once, by
/// [`crate::fold::fold`], once frozen.
#[derive(Debug, Default)]
pub struct Buffer(Vec<Sample>);

impl Buffer {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, sample: Sample) {
        self.0.push(sample);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consumes the buffer, handing its samples to the folder.
    pub fn into_samples(self) -> Vec<Sample> {
        self.0
    }
}

impl From<Vec<Sample>> for Buffer {
    fn from(samples: Vec<Sample>) -> Self {
        Self(samples)
    }
}

impl FromIterator<Sample> for Buffer {
    fn from_iter<T: IntoIterator<Item = Sample>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
