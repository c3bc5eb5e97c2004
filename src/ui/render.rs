use crate::state::{Segment, StreamSegmentKind};
use crate::tools::ActionDirective;
use crossterm::style::{Attribute, Stylize};
use crossterm::terminal::{Clear, ClearType};
use crossterm::{cursor, queue};
use std::io::{self, Write};

const PLACEHOLDER: &str = "Thinking...";
const REASONING_HEADER: &str = "🧠 Thinking Process:";
const RULE_WIDTH: usize = 40;

/// Paints one streamed response as segments arrive.
///
/// A placeholder is shown until the first segment. Reasoning is printed in
/// dim gray italics under a header and closed by a rule once narrative text
/// starts.
pub struct ResponseRenderer<W: Write> {
    out: W,
    placeholder_visible: bool,
    current: Option<StreamSegmentKind>,
    at_line_start: bool,
}

impl<W: Write> ResponseRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            placeholder_visible: false,
            current: None,
            at_line_start: true,
        }
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn begin(&mut self) -> io::Result<()> {
        self.current = None;
        self.at_line_start = true;
        self.placeholder_visible = true;
        write!(self.out, "{}", PLACEHOLDER.dark_grey())?;
        self.out.flush()
    }

    pub fn segment(&mut self, segment: &Segment) -> io::Result<()> {
        self.clear_placeholder()?;

        match (self.current, segment.kind) {
            (Some(StreamSegmentKind::Reasoning), StreamSegmentKind::Reasoning) => {}
            (_, StreamSegmentKind::Reasoning) => {
                self.break_line()?;
                writeln!(self.out, "{}", REASONING_HEADER.dark_grey().bold())?;
            }
            (Some(StreamSegmentKind::Reasoning), StreamSegmentKind::Narrative) => {
                self.close_reasoning()?;
            }
            (_, StreamSegmentKind::Narrative) => {}
        }
        self.current = Some(segment.kind);

        match segment.kind {
            StreamSegmentKind::Reasoning => write!(
                self.out,
                "{}",
                segment.text.as_str().dark_grey().attribute(Attribute::Italic)
            )?,
            StreamSegmentKind::Narrative => write!(self.out, "{}", segment.text)?,
        }
        self.at_line_start = segment.text.ends_with('\n');
        self.out.flush()
    }

    pub fn end(&mut self, cancelled: bool) -> io::Result<()> {
        self.clear_placeholder()?;
        if self.current == Some(StreamSegmentKind::Reasoning) {
            self.close_reasoning()?;
        }
        self.break_line()?;
        if cancelled {
            writeln!(self.out, "{}", "[cancelled]".dark_grey())?;
        }
        self.current = None;
        self.out.flush()
    }

    pub fn preview(&mut self, directive: &ActionDirective) -> io::Result<()> {
        match directive {
            ActionDirective::Execute { command } => {
                writeln!(self.out, "\n[!] The assistant wants to execute:")?;
                writeln!(self.out, "{}", command.as_str().yellow())?;
            }
            ActionDirective::Write { filename, content } => {
                writeln!(self.out, "\n[!] The assistant wants to write '{filename}':")?;
                for line in content.lines() {
                    writeln!(self.out, "{}", line.yellow())?;
                }
            }
        }
        self.out.flush()
    }

    fn clear_placeholder(&mut self) -> io::Result<()> {
        if self.placeholder_visible {
            self.placeholder_visible = false;
            queue!(self.out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine))?;
        }
        Ok(())
    }

    fn close_reasoning(&mut self) -> io::Result<()> {
        self.break_line()?;
        writeln!(self.out, "{}\n", "-".repeat(RULE_WIDTH).dark_grey().bold())?;
        Ok(())
    }

    fn break_line(&mut self) -> io::Result<()> {
        if !self.at_line_start {
            writeln!(self.out)?;
            self.at_line_start = true;
        }
        Ok(())
    }
}
