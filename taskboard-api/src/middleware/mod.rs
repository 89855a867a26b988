/// Tower middleware for the API server
///
/// Authentication and the admin gate are plain `from_fn` layers in `app`;
/// this module holds the standalone tower layers.

pub mod security;
