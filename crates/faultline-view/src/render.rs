use std::collections::BTreeMap;
use std::io::{self, Write};

use faultline_layout::PositionedNode;

use crate::classify::classify;
use crate::inspect::{Inspector, badges, inspect_edge, inspect_node};
use crate::session::{ConnectionStatus, ViewModel};
use crate::temporal::Mode;
use crate::util::time::format_clock;

/// Where frames go. Interaction flows back separately as commands.
pub trait RenderSurface {
    fn render(&mut self, view: &ViewModel<'_>) -> io::Result<()>;
}

/// Plain-text frames: header, scrub line, graph by component and rank,
/// then the inspector when something is selected.
pub struct TextSurface<W: Write> {
    out: W,
    clear_screen: bool,
}

impl<W: Write> TextSurface<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            clear_screen: false,
        }
    }

    /// Redraws in place on an ANSI terminal instead of appending frames.
    pub fn with_clear_screen(out: W) -> Self {
        Self {
            out,
            clear_screen: true,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RenderSurface for TextSurface<W> {
    fn render(&mut self, view: &ViewModel<'_>) -> io::Result<()> {
        if self.clear_screen {
            write!(self.out, "\x1b[2J\x1b[H")?;
        }
        write_header(&mut self.out, view)?;
        write_scrub_line(&mut self.out, view)?;
        write_graph(&mut self.out, view)?;
        if let Some(node) = view.selection.node {
            write_inspector(&mut self.out, &inspect_node(&node.node))?;
        }
        if let Some(edge) = view.selection.edge {
            write_inspector(&mut self.out, &inspect_edge(&edge.edge))?;
        }
        writeln!(self.out)?;
        self.out.flush()
    }
}

fn write_header(out: &mut impl Write, view: &ViewModel<'_>) -> io::Result<()> {
    let badge = match view.temporal.mode {
        Mode::Live => "LIVE",
        Mode::Paused => "HISTORICAL",
    };
    write!(out, "== faultline == [{badge}] {}", view.status.label())?;
    if let ConnectionStatus::Offline(error) = view.status {
        write!(out, " ({error})")?;
    }
    if view.refreshing {
        write!(out, " ...")?;
    }
    writeln!(out)
}

fn write_scrub_line(out: &mut impl Write, view: &ViewModel<'_>) -> io::Result<()> {
    let temporal = &view.temporal;
    write!(
        out,
        "window {} .. {}  cursor {} UTC",
        format_clock(temporal.window_start),
        format_clock(temporal.window_end),
        format_clock(temporal.cursor),
    )?;
    if temporal.cursor < temporal.window_start || temporal.cursor > temporal.window_end {
        write!(out, " (outside window)")?;
    }
    if let Some(ts) = view.snapshot_timestamp {
        write!(out, "  snapshot {}", format_clock(ts))?;
    }
    writeln!(out)
}

fn write_graph(out: &mut impl Write, view: &ViewModel<'_>) -> io::Result<()> {
    if view.graph.nodes.is_empty() {
        return writeln!(out, "(no services)");
    }

    let mut grouped: BTreeMap<(usize, usize), Vec<&PositionedNode>> = BTreeMap::new();
    for positioned in &view.graph.nodes {
        grouped
            .entry((positioned.component, positioned.rank))
            .or_default()
            .push(positioned);
    }

    let selected = view.selection.node.map(|positioned| positioned.node.id.as_str());
    let mut current_component = None;
    for ((component, rank), mut members) in grouped {
        if current_component != Some(component) {
            writeln!(out, "-- group {component} --")?;
            current_component = Some(component);
        }
        members.sort_by_key(|positioned| positioned.order);
        writeln!(out, "  rank {rank}")?;
        for positioned in members {
            let node = &positioned.node;
            let marker = if selected == Some(node.id.as_str()) { '*' } else { ' ' };
            write!(
                out,
                "  {marker} [{:<8}] {} ({}, {})",
                node.health_status.as_str(),
                node.service_name,
                node.id,
                classify(&node.service_name).as_str(),
            )?;
            for badge in badges(node) {
                write!(out, " [{badge}]")?;
            }
            writeln!(out)?;
        }
    }

    if !view.graph.edges.is_empty() {
        writeln!(out, "-- dependencies --")?;
        for positioned in &view.graph.edges {
            let edge = &positioned.edge;
            write!(
                out,
                "    {} -> {} ({:.0}%)",
                edge.source,
                edge.target,
                edge.causal_confidence * 100.0
            )?;
            if edge.is_active {
                write!(out, " active")?;
            }
            if positioned.back_edge {
                write!(out, " (cycle)")?;
            }
            writeln!(out)?;
        }
    }
    Ok(())
}

fn write_inspector(out: &mut impl Write, inspector: &Inspector) -> io::Result<()> {
    writeln!(out, "-- details: {} --", inspector.title)?;
    writeln!(out, "    {}", inspector.subtitle)?;
    for (label, value) in &inspector.rows {
        writeln!(out, "    {label}: {value}")?;
    }
    Ok(())
}
