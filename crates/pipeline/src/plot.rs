//! Interactive trajectory prompt

use std::io::{self, BufRead, Write};

use tracking::{TrajectoryLookupError, TrajectoryQuery};

/// Prompt for track indices (creation order) and print each track's
/// `frame x y` series until `Q` or end of input
pub fn run_plot_prompt<Q, R, W>(query: &Q, mut input: R, mut output: W) -> io::Result<()>
where
    Q: TrajectoryQuery + ?Sized,
    R: BufRead,
    W: Write,
{
    let mut line = String::new();
    loop {
        write!(output, "Enter vehicle index to be plotted (Q + Enter to exit): ")?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            return Ok(());
        }

        let entry = line.trim();
        if entry.eq_ignore_ascii_case("q") {
            return Ok(());
        }

        let Ok(index) = entry.parse::<usize>() else {
            writeln!(output, "Input value must be an integer or Q to exit")?;
            continue;
        };

        match query.trajectory_at(index) {
            Ok(trajectory) => {
                writeln!(
                    output,
                    "vehicle {} ({:?}, {} positions)",
                    trajectory.id,
                    trajectory.status,
                    trajectory.len()
                )?;
                writeln!(output, "frame x y")?;
                for ((frame, x), y) in trajectory.frames.iter().zip(&trajectory.xs).zip(&trajectory.ys) {
                    writeln!(output, "{} {:.2} {:.2}", frame, x, y)?;
                }
            }
            Err(TrajectoryLookupError::OutOfRange { len, .. }) => {
                writeln!(output, "Index out of bounds ({} vehicles)", len)?;
            }
            Err(e) => writeln!(output, "{}", e)?,
        }
    }
}
