//! Tests for lint/rescue-exception

mod support;

use rubric_rules::builtin::RESCUE_EXCEPTION;
use support::{expect_no_offenses, expect_offense};

#[test]
fn flags_rescue_exception_with_body() {
    expect_offense(
        RESCUE_EXCEPTION,
        r#"
begin
  something
rescue Exception
^^^^^^^^^^^^^^^^ Avoid rescuing the `Exception` class. Perhaps you meant to rescue `StandardError`?
  handle_exception
end
"#,
    );
}

#[test]
fn flags_rescue_exception_with_empty_body() {
    expect_offense(
        RESCUE_EXCEPTION,
        r#"
begin
  something
rescue Exception
^^^^^^^^^^^^^^^^ Avoid rescuing the `Exception` class. Perhaps you meant to rescue `StandardError`?
end
"#,
    );
}

#[test]
fn flags_exception_among_several_classes() {
    expect_offense(
        RESCUE_EXCEPTION,
        r#"
begin
  something
rescue StandardError, Exception
^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^ Avoid rescuing the `Exception` class. Perhaps you meant to rescue `StandardError`?
  handle_exception
end
"#,
    );
}

#[test]
fn flags_top_level_constant() {
    expect_offense(
        RESCUE_EXCEPTION,
        r#"
begin
  something
rescue ::Exception => e
^^^^^^^^^^^^^^^^^^^^^^^ Avoid rescuing the `Exception` class. Perhaps you meant to rescue `StandardError`?
  log(e)
end
"#,
    );
}

#[test]
fn flags_rescue_in_method_body() {
    expect_offense(
        RESCUE_EXCEPTION,
        r#"
def process
  something
rescue Exception
^^^^^^^^^^^^^^^^ Avoid rescuing the `Exception` class. Perhaps you meant to rescue `StandardError`?
  cleanup
end
"#,
    );
}

#[test]
fn flags_raising_a_different_exception() {
    expect_offense(
        RESCUE_EXCEPTION,
        r#"
begin
  something
rescue Exception => e
^^^^^^^^^^^^^^^^^^^^^ Avoid rescuing the `Exception` class. Perhaps you meant to rescue `StandardError`?
  raise OtherError
end
"#,
    );
}

#[test]
fn flags_raising_another_variable() {
    expect_offense(
        RESCUE_EXCEPTION,
        r#"
begin
  something
rescue Exception => e
^^^^^^^^^^^^^^^^^^^^^ Avoid rescuing the `Exception` class. Perhaps you meant to rescue `StandardError`?
  other = wrap(e)
  raise other
end
"#,
    );
}

#[test]
fn flags_only_the_broad_clause() {
    expect_offense(
        RESCUE_EXCEPTION,
        r#"
begin
  something
rescue ArgumentError
  retry_later
rescue Exception
^^^^^^^^^^^^^^^^ Avoid rescuing the `Exception` class. Perhaps you meant to rescue `StandardError`?
  give_up
ensure
  close
end
"#,
    );
}

#[test]
fn flags_nested_rescue_independently() {
    expect_offense(
        RESCUE_EXCEPTION,
        r#"
begin
  begin
    something
  rescue Exception
  ^^^^^^^^^^^^^^^^ Avoid rescuing the `Exception` class. Perhaps you meant to rescue `StandardError`?
    nil
  end
rescue Exception
  raise
end
"#,
    );
}

#[test]
fn accepts_other_exception_classes() {
    expect_no_offenses(
        RESCUE_EXCEPTION,
        r#"
begin
  something
rescue StandardError, ArgumentError => e
  handle(e)
end
"#,
    );
}

#[test]
fn accepts_namespaced_exception() {
    expect_no_offenses(
        RESCUE_EXCEPTION,
        r#"
begin
  something
rescue Foo::Exception
  handle
end
"#,
    );
}

#[test]
fn accepts_bare_rescue() {
    expect_no_offenses(
        RESCUE_EXCEPTION,
        r#"
begin
  something
rescue
  handle
end
"#,
    );
}

#[test]
fn accepts_bare_reraise() {
    expect_no_offenses(
        RESCUE_EXCEPTION,
        r#"
begin
  something
rescue Exception
  cleanup
  raise
end
"#,
    );
}

#[test]
fn accepts_bare_reraise_with_variable() {
    expect_no_offenses(
        RESCUE_EXCEPTION,
        r#"
begin
  something
rescue Exception => e
  log(e)
  raise
end
"#,
    );
}

#[test]
fn accepts_reraising_the_variable() {
    expect_no_offenses(
        RESCUE_EXCEPTION,
        r#"
begin
  something
rescue Exception => e
  raise e
end
"#,
    );
}

#[test]
fn reraise_is_matched_by_variable_name() {
    // the variable is reassigned before the raise; only its name is compared
    expect_no_offenses(
        RESCUE_EXCEPTION,
        r#"
begin
  something
rescue Exception => e
  e = other
  raise e
end
"#,
    );
}

#[test]
fn accepts_reraising_the_variable_with_message() {
    expect_no_offenses(
        RESCUE_EXCEPTION,
        r#"
begin
  something
rescue Exception => error
  raise error, "while processing"
end
"#,
    );
}

#[test]
fn accepts_conditional_reraise() {
    expect_no_offenses(
        RESCUE_EXCEPTION,
        r#"
begin
  something
rescue Exception => e
  raise e if fatal?(e)
  log(e)
end
"#,
    );
}

#[test]
fn accepts_kernel_raise() {
    expect_no_offenses(
        RESCUE_EXCEPTION,
        r#"
begin
  something
rescue Exception => e
  Kernel.raise e
end

begin
  something
rescue Exception
  ::Kernel.raise
end
"#,
    );
}

#[test]
fn accepts_files_without_rescue() {
    expect_no_offenses(RESCUE_EXCEPTION, "puts \"hello\"\n");
    expect_no_offenses(RESCUE_EXCEPTION, "");
}
