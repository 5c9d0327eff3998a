use crate::transaction::Transaction;
use crate::utxo_pool::{UtxoEntry, UtxoPool};
use anyhow::{anyhow, Context};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

pub fn read_json_lines<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    let file = File::open(path)
        .with_context(|| format!("can't open input file: {}", path.display()))?;
    let mut items = vec![];
    for (num, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let item = serde_json::from_str(&line)
            .with_context(|| format!("can't parse line {} of {}", num + 1, path.display()))?;
        items.push(item);
    }
    Ok(items)
}

pub fn create_parent_dir(path: &Path) -> anyhow::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
            .with_context(|| format!("can't create directory: {}", parent.display())),
        _ => Ok(()),
    }
}

pub fn dump_json_lines<T: Serialize>(items: &[T], path: &Path) -> anyhow::Result<()> {
    create_parent_dir(path)?;
    let file = File::create(path)
        .with_context(|| format!("can't create output file: {}", path.display()))?;
    let mut output = BufWriter::new(file);
    for item in items.iter() {
        output.write_all(format!("{}\n", serde_json::to_string(item)?).as_bytes())?;
    }
    output.flush()?;
    Ok(())
}

pub fn load_pool(path: &Path) -> anyhow::Result<UtxoPool> {
    let entries: Vec<UtxoEntry> = read_json_lines(path)?;
    if let Some(entry) = entries.iter().find(|entry| entry.output.value.is_negative()) {
        return Err(anyhow!(
            "pool file {} holds negative output {} at {}",
            path.display(),
            entry.output.value,
            entry.output_ref
        ));
    }
    let total = entries.len();
    let pool = UtxoPool::from_entries(entries);
    if pool.len() != total {
        return Err(anyhow!(
            "pool file {} lists {} entries but only {} distinct outputs",
            path.display(),
            total,
            pool.len()
        ));
    }
    Ok(pool)
}

pub fn dump_pool(pool: &UtxoPool, path: &Path) -> anyhow::Result<()> {
    dump_json_lines(&pool.entries(), path)
}

/// Reads a candidate batch. A transaction whose stored hash doesn't match
/// its content fails to parse.
pub fn load_batch(path: &Path) -> anyhow::Result<Vec<Transaction>> {
    read_json_lines(path)
}
