//! Tests for lint/string-conversion-in-interpolation

mod support;

use rubric_rules::builtin::STRING_CONVERSION_IN_INTERPOLATION as RULE;
use support::{expect_correction, expect_no_offenses, expect_offense};

#[test]
fn flags_to_s_in_interpolation() {
    expect_offense(
        RULE,
        r##"
puts "Hello #{name.to_s}!"
                   ^^^^ Redundant use of `Object#to_s` in interpolation.
"##,
    );
}

#[test]
fn flags_each_segment() {
    expect_offense(
        RULE,
        r##"
"a #{x.to_s} b #{y.to_s}"
       ^^^^ Redundant use of `Object#to_s` in interpolation.
                  ^^^^ Redundant use of `Object#to_s` in interpolation.
"##,
    );
}

#[test]
fn flags_implicit_receiver() {
    expect_offense(
        RULE,
        r##"
"#{to_s}"
   ^^^^ Use `self` instead of `Object#to_s` in interpolation.
"##,
    );
}

#[test]
fn corrects_each_segment() {
    expect_correction(
        RULE,
        r##"
"a #{x.to_s} b #{y.to_s}"
"##,
        r##"
"a #{x} b #{y}"
"##,
    );
}

#[test]
fn corrects_implicit_receiver_to_self() {
    expect_correction(RULE, "\"#{to_s}\"\n", "\"#{self}\"\n");
}

#[test]
fn corrects_empty_parentheses() {
    expect_correction(RULE, "\"#{x.to_s()}\"\n", "\"#{x}\"\n");
}

#[test]
fn corrects_complex_receivers() {
    expect_correction(
        RULE,
        r##"
log "#{@name.to_s} #{foo(1, 2).to_s} #{Foo::Bar.to_s}"
"##,
        r##"
log "#{@name} #{foo(1, 2)} #{Foo::Bar}"
"##,
    );
}

#[test]
fn checks_only_the_last_expression_of_a_segment() {
    expect_offense(
        RULE,
        r##"
"#{top; result.to_s}"
               ^^^^ Redundant use of `Object#to_s` in interpolation.
"##,
    );
    expect_correction(
        RULE,
        "\"#{top; result.to_s}\"\n",
        "\"#{top; result}\"\n",
    );
    expect_no_offenses(RULE, "\"#{x.to_s; y}\"\n");
}

#[test]
fn corrects_other_interpolating_literals() {
    expect_correction(
        RULE,
        r##"
pattern = /#{x.to_s}/i
key = :"#{x.to_s}_key"
output = `echo #{x.to_s}`
"##,
        r##"
pattern = /#{x}/i
key = :"#{x}_key"
output = `echo #{x}`
"##,
    );
}

#[test]
fn corrects_nested_interpolation_over_several_passes() {
    expect_correction(
        RULE,
        r##"
"#{"#{x.to_s}".to_s}"
"##,
        r##"
"#{"#{x}"}"
"##,
    );
}

#[test]
fn accepts_to_s_with_arguments() {
    expect_no_offenses(RULE, "\"#{n.to_s(2)}\"\n");
    expect_no_offenses(RULE, "\"#{n.to_s 8}\"\n");
}

#[test]
fn accepts_safe_navigation_to_s() {
    expect_no_offenses(RULE, "\"#{x&.to_s}\"\n");
}

#[test]
fn accepts_plain_interpolation() {
    expect_no_offenses(
        RULE,
        r##"
"#{x}"
"#{x.to_s.upcase}"
"#{}"
'#{x.to_s}'
x.to_s
"##,
    );
}

#[test]
fn leaves_source_alone_when_nothing_to_fix() {
    expect_correction(RULE, "\"#{x}\"\n", "\"#{x}\"\n");
}
