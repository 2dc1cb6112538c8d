//! Whole-document round-trip coverage: parsed documents must reserialize to
//! their input byte for byte.

use dockerfile_model::dockerfile::testing::parse_round_trip;
use dockerfile_model::dockerfile::Instruction;

#[test]
fn test_full_multi_stage_build() {
    let source = "\
# syntax=docker/dockerfile:1
ARG RUST_VERSION=1.79

FROM rust:${RUST_VERSION}-slim AS builder
WORKDIR /app
COPY Cargo.toml Cargo.lock ./
COPY src ./src
RUN --mount=type=cache,target=/app/target \\
    cargo build --release && \\
    cp target/release/app /usr/local/bin/app

FROM debian:bookworm-slim
LABEL org.opencontainers.image.source=https://example.com/repo
ENV RUST_LOG=info \\
    RUST_BACKTRACE=1
COPY --from=builder /usr/local/bin/app /usr/local/bin/app
EXPOSE 8080/tcp
USER nobody
HEALTHCHECK --interval=30s --timeout=3s CMD [\"/usr/local/bin/app\", \"health\"]
ENTRYPOINT [\"/usr/local/bin/app\"]
";
    parse_round_trip(source);
}

#[test]
fn test_casing_and_indentation_preserved() {
    parse_round_trip("from alpine\n  run echo hi\n\tCoPy a b\n");
}

#[test]
fn test_comments_and_blank_lines_preserved() {
    parse_round_trip("# header\n\n\nFROM alpine\n# between\n\nRUN true\n# trailing\n");
}

#[test]
fn test_continuation_with_embedded_comments() {
    parse_round_trip("RUN apt-get update && \\\n  # explain\n  apt-get install -y curl\n");
}

#[test]
fn test_crlf_line_endings() {
    parse_round_trip("FROM alpine\r\nRUN echo hi\r\n");
}

#[test]
fn test_missing_final_newline() {
    parse_round_trip("FROM alpine\nCMD [\"sh\"]");
}

#[test]
fn test_backtick_escape_directive() {
    let doc = parse_round_trip("# escape=`\nFROM windows\nRUN dir `\n  c:\\\n");
    assert_eq!(doc.escape_char(), '`');
}

#[test]
fn test_quoted_values_and_modifiers() {
    parse_round_trip(
        "ARG NAME=\"quoted value\"\nFROM alpine\nENV GREETING='hi there' TARGET=${NAME:-world}\nUSER ${WHO+override}\n",
    );
}

#[test]
fn test_every_instruction_kind() {
    let source = "\
FROM alpine AS base
ARG VERSION
ENV PATH=/usr/bin
LABEL maintainer=me
RUN echo hi
CMD [\"sh\"]
ENTRYPOINT [\"sh\", \"-c\"]
SHELL [\"/bin/bash\", \"-c\"]
COPY a b /dst/
ADD archive.tar.gz /opt/
HEALTHCHECK NONE
EXPOSE 80 443/tcp
WORKDIR /srv
USER root
STOPSIGNAL SIGTERM
MAINTAINER someone@example.com
VOLUME [\"/data\"]
ONBUILD RUN echo derived
";
    let doc = parse_round_trip(source);
    let kinds: Vec<&str> = doc.instructions().map(Instruction::kind).collect();
    assert_eq!(kinds.len(), 18);
    assert_eq!(kinds[0], "FROM");
    assert_eq!(kinds[17], "ONBUILD");
}

mod generated {
    use proptest::prelude::*;

    use dockerfile_model::dockerfile::parse;

    fn line() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("".to_string()),
            Just("# a comment".to_string()),
            Just("  # indented comment".to_string()),
            Just("FROM alpine:3.20".to_string()),
            Just("FROM ubuntu AS base".to_string()),
            Just("ARG VERSION=1.0".to_string()),
            Just("ARG NAME".to_string()),
            Just("ENV A=1 B=two".to_string()),
            Just("LABEL key=value".to_string()),
            Just("RUN echo hello world".to_string()),
            Just("  run echo lowered".to_string()),
            Just("CMD [\"sh\", \"-c\", \"true\"]".to_string()),
            Just("COPY --chown=app:app src /app".to_string()),
            Just("EXPOSE 8080/tcp".to_string()),
            Just("WORKDIR /srv".to_string()),
            Just("USER nobody".to_string()),
            Just("STOPSIGNAL SIGKILL".to_string()),
            Just("VOLUME /data".to_string()),
            Just("ONBUILD RUN echo hi".to_string()),
            Just("HEALTHCHECK NONE".to_string()),
        ]
    }

    proptest! {
        #[test]
        fn generated_documents_round_trip(lines in prop::collection::vec(line(), 0..25)) {
            let mut source = lines.join("\n");
            if !source.is_empty() {
                source.push('\n');
            }
            let doc = parse(&source).unwrap();
            prop_assert_eq!(doc.to_string(), source);
        }
    }
}
