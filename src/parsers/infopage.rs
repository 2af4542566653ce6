//! Info pages: flat lists of developers, publishers, years and the like.

use super::{anchors, browsable_from_link, load_page};
use crate::error::PageError;
use crate::models::Browsable;

/// Page-identity root of info pages.
const ROOT_ID: &str = "infopage";

/// Parses the child links of an info page, in document order.
///
/// Links without text or target, and links leading outside `/music/`, are
/// dropped.
pub fn parse_info_page(html: &str) -> Result<Vec<Browsable>, PageError> {
    let _span = tracing::debug_span!("parse_info_page").entered();

    load_page(html, ROOT_ID, |page| {
        Ok(anchors(page).filter_map(browsable_from_link).collect())
    })
}
