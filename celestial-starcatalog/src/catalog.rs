//! The contract every star backend implements.

use crate::error::Result;
use crate::iterator::{CatalogIterator, ConditionCursor};
use crate::star::{Star, StarSet};
use crate::window::{MagnitudeRange, SkyWindow};

pub trait Catalog {
    /// Short human-readable backend name, used in log messages.
    fn name(&self) -> &str;

    /// Look a star up by its catalog-prefixed name.
    ///
    /// # Errors
    /// [`CatalogError::NotFound`](crate::CatalogError::NotFound) if the name
    /// does not belong to this catalog or is malformed for its grammar.
    fn find(&self, name: &str) -> Result<Star>;

    /// All stars inside `window` within `magrange`, materialized.
    fn find_window(&self, window: &SkyWindow, magrange: &MagnitudeRange) -> Result<StarSet>;

    /// Streaming variant of [`Catalog::find_window`].
    ///
    /// The default filters a full scan; backends with a spatial index
    /// override it.
    fn find_iter(
        &self,
        window: &SkyWindow,
        magrange: &MagnitudeRange,
    ) -> Result<CatalogIterator<'_>> {
        let (window, magrange) = (*window, *magrange);
        let all = self.begin()?;
        Ok(CatalogIterator::new(ConditionCursor::new(
            all,
            move |star: &Star| magrange.contains(star.mag) && window.contains(&star.position),
        )))
    }

    fn number_of_stars(&self) -> Result<u64>;

    /// Iterate every star in the backend's natural storage order.
    fn begin(&self) -> Result<CatalogIterator<'_>>;

    fn end(&self) -> CatalogIterator<'_> {
        CatalogIterator::end()
    }
}

/// Collect the stars of an in-memory map that fall in `window` and `magrange`.
pub(crate) fn collect_window<'a, T, I>(
    stars: I,
    window: &SkyWindow,
    magrange: &MagnitudeRange,
) -> StarSet
where
    T: AsRef<Star> + 'a,
    I: IntoIterator<Item = &'a T>,
{
    stars
        .into_iter()
        .map(AsRef::as_ref)
        .filter(|s| magrange.contains(s.mag) && window.contains(&s.position))
        .cloned()
        .collect()
}

/// Split a `<PREFIX><decimal>` name into its number.
pub(crate) fn prefixed_number(name: &str, prefix: &str) -> Result<u32> {
    name.strip_prefix(prefix)
        .map(str::trim)
        .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|digits| digits.parse().ok())
        .ok_or_else(|| {
            crate::error::CatalogError::not_found(format!("'{}' is not a {} name", name, prefix))
        })
}
