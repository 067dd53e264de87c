mod helpers;
mod test_check;
mod test_fix;
mod test_listing;
