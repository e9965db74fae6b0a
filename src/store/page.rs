//! Page arithmetic for meme listings.
//!
//! Pages are numbered from 1. Page `n` covers active rows
//! `[(n - 1) * PAGE_SIZE, n * PAGE_SIZE)` in id order.

/// Number of memes per listing page.
pub const PAGE_SIZE: u32 = 10;

/// Row offset of the first record on `page` (pages below 1 are treated as 1).
pub fn page_offset(page: u32) -> u64 {
    u64::from(page.max(1) - 1) * u64::from(PAGE_SIZE)
}

/// Number of pages needed to hold `count` active records.
pub fn max_page_for(count: u64) -> u32 {
    let pages = count.div_ceil(u64::from(PAGE_SIZE));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Clamp a requested page into `1..=max_page`.
///
/// An absent or zero page becomes 1. A page past the end becomes the last
/// page. With no records at all the result is still 1.
pub fn normalize_page(requested: Option<u32>, max_page: u32) -> u32 {
    match requested {
        None | Some(0) => 1,
        Some(page) if page > max_page => max_page.max(1),
        Some(page) => page,
    }
}
