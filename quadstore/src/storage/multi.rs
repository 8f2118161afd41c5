//! Fixed-stride decoding of bulk duplicate pages.
//!
//! A single bulk read of a duplicate-sorted index returns one contiguous
//! page holding many fixed-width values back to back. [`Multi`] slices that
//! page into discrete values in memory, so k results cost one engine read
//! instead of k point reads.
//!
//! # Usage
//!
//! ```
//! use quadstore::storage::{Multi, Stride};
//!
//! let page = [1u8, 2, 3, 4, 5, 6];
//! let multi = Stride(2).multiple(&page[..]).unwrap();
//! assert_eq!(multi.len(), 3);
//! assert_eq!(multi.val(1), &[3, 4]);
//! ```

use std::borrow::Cow;

/// The fixed element width of a [`Multi`] page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stride(pub usize);

impl Stride {
    /// Wrap `page` as a [`Multi`] of this stride.
    ///
    /// # Errors
    ///
    /// Returns [`MultiError::InvalidStride`] for a zero stride and
    /// [`MultiError::Incongruent`] if the page length is not a multiple of
    /// the stride.
    pub fn multiple<'a>(self, page: impl Into<Cow<'a, [u8]>>) -> Result<Multi<'a>, MultiError> {
        if self.0 == 0 {
            return Err(MultiError::InvalidStride);
        }
        let page = page.into();
        if page.len() % self.0 != 0 {
            return Err(MultiError::Incongruent {
                stride: self.0,
                page_len: page.len(),
            });
        }
        Ok(Multi {
            page,
            stride: self.0,
        })
    }
}

/// A page of contiguous values, each exactly `stride` bytes wide.
///
/// Borrows the page when built from a slice; [`Multi::append`] promotes it
/// to an owned buffer.
///
/// # Invariants
///
/// - `stride > 0`
/// - `page.len() % stride == 0`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Multi<'a> {
    page: Cow<'a, [u8]>,
    stride: usize,
}

impl<'a> Multi<'a> {
    /// An empty page of the given stride.
    ///
    /// # Errors
    ///
    /// Returns [`MultiError::InvalidStride`] for a zero stride.
    pub fn empty(stride: Stride) -> Result<Self, MultiError> {
        stride.multiple(Vec::new())
    }

    /// Number of values in the page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.page.len() / self.stride
    }

    /// Returns `true` if the page holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.page.is_empty()
    }

    /// Width of a single value.
    #[must_use]
    pub const fn stride(&self) -> usize {
        self.stride
    }

    /// Total byte size of the page, equal to `len() * stride()`.
    #[must_use]
    pub fn size(&self) -> usize {
        self.page.len()
    }

    /// The raw page data.
    #[must_use]
    pub fn page(&self) -> &[u8] {
        &self.page
    }

    /// The value at index `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= len()`.
    #[must_use]
    pub fn val(&self, i: usize) -> &[u8] {
        let offset = i * self.stride;
        &self.page[offset..offset + self.stride]
    }

    /// The value at index `i`, or `None` if out of range.
    #[must_use]
    pub fn get(&self, i: usize) -> Option<&[u8]> {
        let offset = i.checked_mul(self.stride)?;
        self.page.get(offset..offset.checked_add(self.stride)?)
    }

    /// Iterate over the values in order.
    pub fn iter(&self) -> std::slice::ChunksExact<'_, u8> {
        self.page.chunks_exact(self.stride)
    }

    /// Materialize every value as a slice.
    #[must_use]
    pub fn vals(&self) -> Vec<&[u8]> {
        self.iter().collect()
    }

    /// The last value in the page.
    #[must_use]
    pub fn last(&self) -> Option<&[u8]> {
        self.len().checked_sub(1).map(|i| self.val(i))
    }

    /// Append one value, returning the extended page.
    ///
    /// # Errors
    ///
    /// Returns [`MultiError::WidthMismatch`] if `value.len() != stride()`.
    pub fn append(mut self, value: &[u8]) -> Result<Self, MultiError> {
        if value.len() != self.stride {
            return Err(MultiError::WidthMismatch {
                stride: self.stride,
                len: value.len(),
            });
        }
        self.page.to_mut().extend_from_slice(value);
        Ok(self)
    }

    /// Detach the page from any borrowed buffer.
    #[must_use]
    pub fn into_owned(self) -> Multi<'static> {
        Multi {
            page: Cow::Owned(self.page.into_owned()),
            stride: self.stride,
        }
    }
}

/// Errors from building or extending a [`Multi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultiError {
    /// Stride must be positive.
    InvalidStride,
    /// Page length is not a multiple of the stride.
    Incongruent { stride: usize, page_len: usize },
    /// An appended value does not match the stride.
    WidthMismatch { stride: usize, len: usize },
}

impl std::fmt::Display for MultiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidStride => write!(f, "invalid stride"),
            Self::Incongruent { stride, page_len } => write!(
                f,
                "page of {page_len} bytes is not congruent with stride {stride}"
            ),
            Self::WidthMismatch { stride, len } => {
                write!(f, "value of {len} bytes does not match stride {stride}")
            }
        }
    }
}

impl std::error::Error for MultiError {}
