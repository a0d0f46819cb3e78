pub mod cart_totals;
pub mod navigation;
pub mod pagination;
pub mod product_filter;
pub mod sorting;
pub mod url_params;
