use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use serde_json::json;

use evn_chain::InMemoryChain;
use evn_crypto::{LeafHasher, MerkleTree};
use evn_notary::{AuditData, NotaryConfig, NotaryService};
use evn_types::{EvidenceItem, RunId};

use crate::cli::{Cli, Command, OutputFormat};

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::LeafHash(ref args) => {
            let digest = LeafHasher::LEAF.leaf_hash(&args.text);
            match cli.format {
                OutputFormat::Text => println!("{digest}"),
                OutputFormat::Json => println!("{}", json!({ "leaf_hash": digest.to_hex() })),
            }
            Ok(())
        }
        Command::Root(ref args) => {
            let items = read_evidence(&args.file)?;
            let leaves = items
                .iter()
                .filter(|item| !LeafHasher::normalize(&item.text).is_empty())
                .map(|item| LeafHasher::LEAF.leaf_hash(&item.text))
                .collect();
            let root = MerkleTree::build(leaves).root();
            match cli.format {
                OutputFormat::Text => println!("{root}"),
                OutputFormat::Json => println!(
                    "{}",
                    json!({ "merkle_root": root.to_hex(), "item_count": items.len() })
                ),
            }
            Ok(())
        }
        Command::Notarize(ref args) => notarize(&cli, args).await,
    }
}

async fn notarize(cli: &Cli, args: &crate::cli::NotarizeArgs) -> anyhow::Result<()> {
    let evidence = read_evidence(&args.file)?;
    let run_id = RunId::new(args.run_id.clone())?;

    // Local in-memory devnet: ephemeral, but exercises the full pipeline.
    let chain = Arc::new(InMemoryChain::new(1337));
    let config = NotaryConfig::devnet(hex::encode([0x11u8; 32]), hex::encode([0x22u8; 32]));
    let service = NotaryService::from_config(chain, config)?;

    let record = service
        .notarize(run_id.clone(), evidence.clone(), args.audit)
        .await?;
    let verification = service.verify_root(&run_id, Some(&evidence)).await?;
    let audit = service.fetch_audit(&run_id).await?;

    match cli.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "run_id": record.run_id.as_str(),
                    "merkle_root": record.merkle_root.to_hex(),
                    "notary_tx_hash": record.notary_tx_hash.to_hex(),
                    "notary_block_number": record.notary_block_number,
                    "commit_tx_hash": record.commit_tx_hash.map(|tx| tx.to_hex()),
                    "commit_block_number": record.commit_block_number,
                    "network": record.network,
                    "skipped_items": record.skipped_items,
                    "verified": verification.verified,
                    "audit_committed": matches!(audit, AuditData::Committed { .. }),
                }))?
            );
        }
        OutputFormat::Text => {
            println!("{}", "notarized".green().bold());
            println!("  run id:       {}", record.run_id);
            println!("  merkle root:  {}", record.merkle_root);
            println!(
                "  publish tx:   {} (block {})",
                record.notary_tx_hash, record.notary_block_number
            );
            if let (Some(tx), Some(block)) = (&record.commit_tx_hash, record.commit_block_number) {
                println!("  audit tx:     {tx} (block {block})");
            }
            if !record.skipped_items.is_empty() {
                println!(
                    "  {} {:?}",
                    "skipped empty items:".yellow(),
                    record.skipped_items
                );
            }
            let verdict = if verification.verified {
                "verified".green()
            } else {
                "mismatch".red()
            };
            println!("  verification: {verdict}");
            if let AuditData::Committed {
                data_hash_verified, ..
            } = audit
            {
                println!(
                    "  audit record: committed (integrity {})",
                    if data_hash_verified { "ok" } else { "MISMATCH" }
                );
            }
        }
    }
    Ok(())
}

fn read_evidence(path: &Path) -> anyhow::Result<Vec<EvidenceItem>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading evidence file {}", path.display()))?;
    Ok(content.lines().map(EvidenceItem::new).collect())
}
