//! Instance file parsing: a wall-fenced grid, a charge line, a `packages`
//! header and one delivery per remaining line.
use enum_as_inner::EnumAsInner;
use itertools::Itertools;
use miette::{NamedSource, Result, SourceSpan};
use nom::{
    Parser,
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{char, i32 as integer, line_ending, none_of},
    combinator::{eof, peek},
    multi::{many0, many1},
    sequence::{delimited, preceded, terminated},
};
use nom_locate::{LocatedSpan, position};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::{
    error::InstanceError,
    grid::SpacePoint,
    instance::{Delivery, Instance},
};

type Span<'a> = LocatedSpan<&'a str>;
type IResult<'a, T> = nom::IResult<Span<'a>, T>;

struct Spanned<'a, T> {
    span: Span<'a>,
    inner: T,
}

#[derive(Debug, Clone, Copy, EnumAsInner)]
enum Cell {
    Empty,
    Wall,
    Shelf(char),
    Charger,
    Robot(u8),
}

pub(crate) fn parse(filename: &str, content: &str) -> Result<Instance> {
    let src = NamedSource::new(filename, content.to_string());

    let (rest, grid) = rows(Span::new(content)).map_err(|_| InstanceError::EmptyInstance {
        src: src.clone(),
    })?;

    let width = grid.first().map(Vec::len).unwrap_or_default();
    for row in &grid {
        let offset = row
            .first()
            .map(|c| c.span.location_offset())
            .unwrap_or_default();
        if row.len() != width {
            return Err(InstanceError::RaggedRow {
                src: src.clone(),
                expected: width,
                found: row.len(),
                row: (offset, row.len()).into(),
            }
            .into());
        }
        for edge in [row.first(), row.last()].into_iter().flatten() {
            if !edge.inner.is_wall() {
                return Err(InstanceError::UnfencedRow {
                    src: src.clone(),
                    highlight: (edge.span.location_offset(), 1).into(),
                }
                .into());
            }
        }
    }

    let height = grid.len() as i32 - 2;
    if height < 0 || width < 2 {
        return Err(InstanceError::GridTooSmall { src }.into());
    }

    // Interior cells only, with the wall border stripped away
    let cells = grid
        .iter()
        .enumerate()
        .skip(1)
        .take(height as usize)
        .flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .skip(1)
                .take(width - 2)
                .map(move |(x, c)| (SpacePoint::new(x as i32 - 1, y as i32 - 1), c))
        })
        .collect::<Vec<_>>();

    let mut shelves: FxHashMap<char, (SpacePoint, SourceSpan)> = FxHashMap::default();
    for (p, c) in &cells {
        if let Some(&letter) = c.inner.as_shelf() {
            let span: SourceSpan = (c.span.location_offset(), 1).into();
            if let Some((_, first)) = shelves.insert(letter, (*p, span)) {
                return Err(InstanceError::DuplicateShelf {
                    src: src.clone(),
                    a: first,
                    b: span,
                }
                .into());
            }
        }
    }

    let mut robots: FxHashMap<u8, (SpacePoint, SourceSpan)> = FxHashMap::default();
    for (p, c) in &cells {
        if let Some(&id) = c.inner.as_robot() {
            let span: SourceSpan = (c.span.location_offset(), 1).into();
            if let Some((_, first)) = robots.insert(id, (*p, span)) {
                return Err(InstanceError::DuplicateRobot {
                    src: src.clone(),
                    a: first,
                    b: span,
                }
                .into());
            }
        }
    }

    let chargers = cells
        .iter()
        .filter(|(_, c)| c.inner.is_charger())
        .map(|(p, _)| *p)
        .collect::<Vec<_>>();

    let (rest, max_charge) = charge(rest).map_err(|_| InstanceError::MissingCharge {
        src: src.clone(),
        highlight: caret(content, rest.location_offset()),
    })?;
    let (rest, _) = packages(rest).map_err(|_| InstanceError::MissingPackages {
        src: src.clone(),
        highlight: caret(content, rest.location_offset()),
    })?;

    let mut deliveries = Vec::new();
    let mut rest = rest;
    loop {
        let blank: IResult<Vec<Span>> = many0(line_ending).parse(rest);
        let (r, _) = blank.unwrap_or((rest, Vec::new()));
        if r.fragment().is_empty() {
            break;
        }
        let Ok((next, (id, pickup, dropoff))) = delivery(r) else {
            return Err(InstanceError::MalformedDelivery {
                src: src.clone(),
                highlight: caret(content, r.location_offset()),
            }
            .into());
        };
        for shelf in [&pickup, &dropoff] {
            if !shelves.contains_key(&shelf.inner) {
                return Err(InstanceError::NoSuchShelf {
                    src: src.clone(),
                    shelf: shelf.inner,
                    highlight: (shelf.span.location_offset(), 1).into(),
                }
                .into());
            }
        }
        deliveries.push(Delivery {
            id,
            pickup: pickup.inner,
            dropoff: dropoff.inner,
        });
        rest = next;
    }

    let shelves = shelves
        .into_iter()
        .map(|(letter, (p, _))| (letter, p))
        .collect::<FxHashMap<_, _>>();
    let robots = robots
        .into_iter()
        .sorted_by_key(|(id, _)| *id)
        .map(|(id, (p, _))| (id, p))
        .collect::<Vec<_>>();

    debug!(
        width = width - 2,
        height,
        charge = max_charge,
        shelves = shelves.len(),
        chargers = chargers.len(),
        robots = robots.len(),
        deliveries = deliveries.len(),
        "parsed instance"
    );

    Ok(Instance {
        width: width as i32 - 2,
        height,
        charge: max_charge,
        shelves,
        chargers,
        robots,
        deliveries,
    })
}

/// A span one character wide, clamped into the source
fn caret(content: &str, offset: usize) -> SourceSpan {
    if offset < content.len() {
        (offset, 1).into()
    } else {
        (content.len().saturating_sub(1), 0).into()
    }
}

fn rows(s: Span) -> IResult<Vec<Vec<Spanned<Cell>>>> {
    many1(row).parse(s)
}

fn row(s: Span) -> IResult<Vec<Spanned<Cell>>> {
    let (s, _) = peek(char('#')).parse(s)?;
    terminated(many1(cell), alt((line_ending, eof))).parse(s)
}

fn cell(s: Span) -> IResult<Spanned<Cell>> {
    let (s, span) = position(s)?;
    let (s, c) = none_of("\r\n").parse(s)?;
    let inner = match c {
        '#' => Cell::Wall,
        '_' => Cell::Charger,
        'A'..='Z' => Cell::Shelf(c),
        '0'..='9' => Cell::Robot(c as u8 - b'0'),
        _ => Cell::Empty,
    };
    Ok((s, Spanned { span, inner }))
}

fn charge(s: Span) -> IResult<i32> {
    delimited(tag("charge "), integer, rest_of_line).parse(s)
}

fn packages(s: Span) -> IResult<Span> {
    preceded(tag("packages"), rest_of_line).parse(s)
}

fn delivery(s: Span) -> IResult<(char, Spanned<char>, Spanned<char>)> {
    let (s, id) = none_of(" \r\n").parse(s)?;
    let (s, _) = char(' ').parse(s)?;
    let (s, pickup) = spanned_char(s)?;
    let (s, _) = char(' ').parse(s)?;
    let (s, dropoff) = spanned_char(s)?;
    let (s, _) = rest_of_line(s)?;
    Ok((s, (id, pickup, dropoff)))
}

fn spanned_char(s: Span) -> IResult<Spanned<char>> {
    let (s, span) = position(s)?;
    let (s, inner) = none_of(" \r\n").parse(s)?;
    Ok((s, Spanned { span, inner }))
}

fn rest_of_line(s: Span) -> IResult<Span> {
    terminated(
        take_while(|c: char| c != '\n' && c != '\r'),
        alt((line_ending, eof)),
    )
    .parse(s)
}
