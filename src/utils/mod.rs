pub mod mxc;
pub mod url_locks;
