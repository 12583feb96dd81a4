//! This module provides the parser for machine definitions, utilizing the `pest` crate.
//! It defines the grammar for `.tur` files and functions to parse the input into a
//! `MachineDefinition`.

use crate::{
    analyzer::analyze,
    machine::Machine,
    types::{
        Condition, Direction, Effect, MachineDefinition, Symbol, Transition, TumasError,
        DEFAULT_BLANK_SYMBOL, MAX_PROGRAM_SIZE,
    },
};
use pest::{
    error::{Error, ErrorVariant},
    iterators::{Pair, Pairs},
    Parser as PestParser, Span,
};
use pest_derive::Parser as PestParser;
use std::collections::HashSet;
use tracing::debug;

/// Derives a `PestParser` for the machine grammar defined in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct MachineParser;

/// Parses the given input string into a `MachineDefinition`.
///
/// This is the main entry point for parsing machine definitions. It trims the input, parses
/// it using the `MachineParser`, and then processes the resulting parse tree into a structured
/// `MachineDefinition`. The parsed definition is automatically analyzed before being returned.
///
/// # Arguments
///
/// * `input` - A string slice containing the machine definition.
///
/// # Returns
///
/// * `Ok(MachineDefinition)` if the input is successfully parsed and validated.
/// * `Err(TumasError::ParseError)` if there are any syntax errors.
/// * `Err(TumasError::ValidationError)` if the definition fails validation.
pub fn parse(input: &str) -> Result<MachineDefinition, TumasError> {
    if input.len() > MAX_PROGRAM_SIZE {
        return Err(TumasError::ValidationError(format!(
            "Program is too large ({} bytes, at most {MAX_PROGRAM_SIZE} allowed)",
            input.len()
        )));
    }

    let root = MachineParser::parse(Rule::program, input.trim())
        .map_err(|e| TumasError::ParseError(Box::new(e)))?
        .next()
        .ok_or_else(|| TumasError::ValidationError("Empty program".to_string()))?;

    let definition = parse_program(root)?;
    debug!(
        name = %definition.name,
        transitions = definition.transitions.len(),
        "parsed machine definition"
    );

    // Analyze the parsed definition
    analyze(&definition)?;

    Ok(definition)
}

/// Parses and builds a runnable `Machine` in one go.
///
/// On top of the errors returned by [`parse`], this fails with
/// `TumasError::ConfigurationError` when two rules share the same condition.
pub fn parse_machine(input: &str) -> Result<Machine, TumasError> {
    Machine::new(parse(input)?)
}

/// Parses the top-level structure of a definition from a `Pair<Rule::program>`.
fn parse_program(pair: Pair<Rule>) -> Result<MachineDefinition, TumasError> {
    let mut name: Option<String> = None;
    let mut tape: Option<String> = None;
    let mut head: Option<i64> = None;
    let mut blank: Option<Symbol> = None;
    let mut transitions: Option<Vec<Transition>> = None;
    let mut initial_state: Option<String> = None;
    let mut seen = HashSet::new();

    for p in pair.into_inner() {
        let span = p.as_span();
        let rule = p.as_rule();

        check_unique_rule(rule, span, &mut seen)?;

        match rule {
            Rule::name => name = Some(parse_inner_string(p).trim().to_string()),
            Rule::blank => blank = Some(parse_symbol(&parse_inner_string(p))),
            Rule::tape => tape = Some(parse_tape(p)),
            Rule::head => head = Some(parse_head(p)?),
            Rule::rules => transitions = Some(parse_transitions(p, &mut initial_state)?),
            _ => {} // Skip EOI
        }
    }

    // Handle mandatory checks
    let name = check_required_rule(name, "name")?;
    let transitions = check_required_rule(transitions, "rules")?;
    let initial_state = check_required_rule(initial_state, "rules")?;
    let tape = check_required_rule(tape, "tape")?;

    Ok(MachineDefinition {
        name,
        initial_state,
        blank: blank.unwrap_or(DEFAULT_BLANK_SYMBOL),
        tape,
        head: head.unwrap_or(0),
        transitions,
    })
}

/// Parses the tape contents from a `Pair<Rule::tape>`.
fn parse_tape(pair: Pair<Rule>) -> String {
    // Rule: tape > symbols > [symbol]
    pair.into_inner()
        .filter(|p| p.as_rule() == Rule::symbols)
        .flat_map(|symbols| symbols.into_inner())
        .filter(|p| p.as_rule() == Rule::symbol)
        .map(|p| parse_symbol(p.as_str()))
        .collect()
}

/// Parses the initial head position from a `Pair<Rule::head>`.
fn parse_head(pair: Pair<Rule>) -> Result<i64, TumasError> {
    let span = pair.as_span();
    let index = parse_inner_string(pair);
    index
        .parse::<i64>()
        .map_err(|_| parse_error(&format!("Invalid head position: {index}"), span))
}

/// Parses the transition rules section from a `Pair<Rule::rules>`.
///
/// The first state block sets the initial state. A state may only have one block.
fn parse_transitions(
    pair: Pair<Rule>,
    initial_state: &mut Option<String>,
) -> Result<Vec<Transition>, TumasError> {
    let mut transitions = Vec::new();
    let mut states = HashSet::new();

    for block in pair.into_inner() {
        let span = block.as_span();
        let mut pairs = block.into_inner();
        let state = parse_string(&mut pairs);

        // Set first state as initial state
        if initial_state.is_none() {
            *initial_state = Some(state.clone());
        }

        // Prevent duplicated state block
        if !states.insert(state.clone()) {
            return Err(parse_error(
                &format!("Duplicate transition rule: {state}"),
                span,
            ));
        }

        for action in pairs.filter(|p| p.as_rule() == Rule::action) {
            transitions.push(parse_action(&state, action)?);
        }
    }

    Ok(transitions)
}

/// Parses a single action from a `Pair<Rule::action>`.
///
/// It extracts the read symbol, write symbol (defaults to read if omitted), direction, and
/// next state.
fn parse_action(state: &str, pair: Pair<Rule>) -> Result<Transition, TumasError> {
    let mut pairs = pair.into_inner();
    let read = parse_symbol_from_pairs(&mut pairs);

    // If `write` is omitted, we'll make `write` equal to `read`
    let write = match pairs.peek().map(|p| p.as_rule()) {
        Some(Rule::symbol) => parse_symbol_from_pairs(&mut pairs),
        _ => read,
    };

    let direction = match pairs.next() {
        Some(p) => parse_direction(p)?,
        None => {
            return Err(TumasError::ValidationError(format!(
                "Missing direction in state {state}"
            )))
        }
    };
    let next = parse_string(&mut pairs);

    Ok(Transition::new(
        Condition::new(state, read),
        Effect::new(next, write, direction),
    ))
}

/// Parses a single direction from a `Pair<Rule::direction>`.
///
/// Supports '<' or 'L' for Left and '>' or 'R' for Right. The head always moves, so a "stay"
/// direction is rejected like any other unknown token.
fn parse_direction(pair: Pair<Rule>) -> Result<Direction, TumasError> {
    let span = pair.as_span();
    match pair.as_str() {
        "<" | "L" => Ok(Direction::Left),
        ">" | "R" => Ok(Direction::Right),
        _ => Err(parse_error(
            &format!("Unsupported direction: {}", pair.as_str()),
            span,
        )),
    }
}

/// Creates a `TumasError::ParseError` from a message and a `Span`.
fn parse_error(msg: &str, span: Span) -> TumasError {
    TumasError::ParseError(Box::new(Error::new_from_span(
        ErrorVariant::CustomError {
            message: msg.to_string(),
        },
        span,
    )))
}

/// Parses a single character symbol from a string, handling quoted and unquoted symbols.
fn parse_symbol(input: &str) -> Symbol {
    let unquoted = if input.len() > 1 {
        input.trim_matches('\'')
    } else {
        input
    };
    unquoted.chars().next().unwrap_or(DEFAULT_BLANK_SYMBOL)
}

/// Parses a single character symbol from a `Pairs` iterator.
fn parse_symbol_from_pairs(pairs: &mut Pairs<Rule>) -> Symbol {
    parse_symbol(&parse_string(pairs))
}

/// Extracts the inner string content from a `Pair`.
fn parse_inner_string(pair: Pair<Rule>) -> String {
    pair.into_inner()
        .next()
        .map(|p| p.as_str().to_string())
        .unwrap_or_default()
}

/// Extracts the string content from the current `Pair` in a `Pairs` iterator.
fn parse_string(pairs: &mut Pairs<Rule>) -> String {
    pairs
        .next()
        .map(|p| p.as_str().to_string())
        .unwrap_or_default()
}

/// Checks if a given section has already been declared.
fn check_unique_rule(rule: Rule, span: Span, seen: &mut HashSet<Rule>) -> Result<(), TumasError> {
    if !matches!(
        rule,
        Rule::name | Rule::blank | Rule::tape | Rule::head | Rule::rules
    ) {
        return Ok(());
    };

    if !seen.insert(rule) {
        return Err(parse_error(
            &format!("Duplicate \"{rule:?}:\" declaration"),
            span,
        ));
    }

    Ok(())
}

/// Checks if a required section is present, returning an `Err` if it's missing.
fn check_required_rule<T>(value: Option<T>, name: &str) -> Result<T, TumasError> {
    value.ok_or_else(|| TumasError::ValidationError(format!("Missing '{name}' section")))
}
