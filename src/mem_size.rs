use crate::scan::{Occurrence, Tally};

/// Heap-inclusive size, used for the verbose footprint reports.
pub(crate) trait DeepSize {
    fn deep_size_of(&self) -> usize {
        size_of_val(self) + self.deep_size_of_children()
    }

    fn deep_size_of_children(&self) -> usize;
}

impl<T: DeepSize> DeepSize for Vec<T> {
    fn deep_size_of_children(&self) -> usize {
        self.iter().map(DeepSize::deep_size_of).sum::<usize>()
            + (self.capacity() - self.len()) * size_of::<T>()
    }
}

impl<T: DeepSize> DeepSize for Box<[T]> {
    fn deep_size_of_children(&self) -> usize {
        self.iter().map(DeepSize::deep_size_of).sum()
    }
}

impl<T: DeepSize> DeepSize for Option<T> {
    fn deep_size_of_children(&self) -> usize {
        match &self {
            Some(t) => t.deep_size_of_children(),
            None => 0,
        }
    }
}

impl DeepSize for Occurrence {
    fn deep_size_of_children(&self) -> usize {
        0
    }
}

impl DeepSize for Tally {
    fn deep_size_of_children(&self) -> usize {
        self.counts.capacity() * (size_of::<crate::Keyword>() + size_of::<usize>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl DeepSize for u32 {
        fn deep_size_of_children(&self) -> usize {
            0
        }
    }

    #[test]
    fn counts_spare_capacity() {
        let mut vec: Vec<u32> = Vec::with_capacity(8);
        vec.push(1);
        assert_eq!(vec.deep_size_of(), size_of::<Vec<u32>>() + 8 * 4);
        assert_eq!(Some(vec).deep_size_of_children(), 8 * 4);
        assert_eq!(None::<Vec<u32>>.deep_size_of_children(), 0);
    }
}
