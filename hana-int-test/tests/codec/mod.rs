//! WKB round trips through result rows.

mod wkb_row_test;
