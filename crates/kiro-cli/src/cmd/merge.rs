use crate::output::print_json;
use anyhow::Context;
use kiro_core::merge::{merge_file, MergeOptions};
use std::path::Path;

pub fn run(src: &Path, dest: &Path, dry_run: bool, json: bool) -> anyhow::Result<()> {
    let report = merge_file(src, dest, &MergeOptions { dry_run })
        .with_context(|| format!("failed to merge {} into {}", src.display(), dest.display()))?;

    if json {
        print_json(&report)?;
    } else {
        println!("{report}");
    }

    Ok(())
}
