use stripemd::error::Result;
use stripemd::export::{encode_fh, ExportHandle, HandleEntry, FH_ENTRY_WORDS};

use crate::cli::{FhAction, ObjectKind};

fn describe(entry: &HandleEntry) -> String {
    let kind = match entry.mode {
        m if m == libc::S_IFDIR as u32 => "dir".to_string(),
        m if m == libc::S_IFREG as u32 => "file".to_string(),
        m => format!("mode {:#o}", m),
    };
    format!("{} ({})", entry.fid, kind)
}

pub fn handle_fh_command(action: FhAction) -> Result<()> {
    match action {
        FhAction::Encode { fid, mode, parent } => {
            let child = HandleEntry::new(fid, mode.mode());
            let parent = parent.map(|p| HandleEntry::new(p, ObjectKind::Dir.mode()));
            let handle = encode_fh(child, parent, 2 * FH_ENTRY_WORDS)?;
            println!("{}", handle);
        }
        FhAction::Decode { handle } => {
            let handle: ExportHandle = handle.parse()?;
            println!("type:   {}", handle.fh_type);
            println!("object: {}", describe(&handle.child));
            if let Some(parent) = &handle.parent {
                println!("parent: {}", describe(parent));
            }
        }
    }
    Ok(())
}
