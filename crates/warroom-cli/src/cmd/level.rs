use crate::cmd::Session;
use crate::output::print_json;
use std::path::Path;

pub fn run(data_dir: &Path, json: bool) -> anyhow::Result<()> {
    let session = Session::open(data_dir)?;
    let info = session.room.level();

    if json {
        print_json(&info)?;
        return Ok(());
    }

    println!("Level {} {} ({} XP)", info.level, info.title, info.xp);
    match info.next {
        Some(next) => println!(
            "  {:.0}% to level {} at {} XP ({} to go)",
            info.progress_percent,
            info.level + 1,
            next,
            info.xp_to_next
        ),
        None => println!("  Top level reached"),
    }
    Ok(())
}
