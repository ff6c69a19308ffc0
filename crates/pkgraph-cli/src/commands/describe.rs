//! Handler for `pkgraph describe`.

use std::path::Path;

use miette::Result;

use pkgraph_ops::ops_describe::{self, DescribeOptions};

pub fn exec(project_root: &Path, json: bool, skip_tests: bool) -> Result<()> {
    let opts = DescribeOptions { json, skip_tests };
    ops_describe::describe(project_root, &opts)
}
