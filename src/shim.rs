// src/shim.rs

//! Node.js shim for reaching transpiler packages.
//!
//! The Rust side never loads JavaScript itself. It spawns Node and runs a
//! tiny shim script which:
//! - Resolves the candidate package from the configured project directory
//! - Either reports whether it exposes `transpile`, or calls it once
//! - Routes every console call of the engine to STDERR
//! - Emits ONE JSON object to STDOUT at the very end
//!
//! Keeping STDOUT clean lets the Rust side parse the answer safely.

/// File name the shim is written under (CommonJS, so `require` works).
pub const NODE_SHIM_NAME: &str = "pine_engine_shim.cjs";

/// Node.js shim (CommonJS).
///
/// Usage (internal):
/// node pine_engine_shim.cjs probe <moduleId> <resolveFrom>
/// node pine_engine_shim.cjs transpile <moduleId> <resolveFrom> <source.pine>
///
/// Expected engine shape:
/// module.exports.transpile = (source) => string
pub fn node_shim() -> &'static str {
    r#"
const fs = require("node:fs");
const path = require("node:path");
const { createRequire } = require("node:module");

const [, , mode, moduleId, resolveFrom, sourcePath] = process.argv;

// Exit through process.exitCode only: process.exit() can truncate a pending
// write to a pipe.
function emit(payload, code = 0) {
  process.stdout.write(JSON.stringify(payload));
  return code;
}

// Route engine logs to STDERR so STDOUT stays clean JSON
const rawStderr = console.error;
console.log = (...args) => rawStderr("__PINE_LOG__ " + args.join(" "));
console.info = console.log;
console.warn = (...args) => rawStderr("__PINE_ERR__ " + args.join(" "));
console.error = console.warn;

function describe(e) {
  return { message: e?.message || String(e), stack: e?.stack || null };
}

function main() {
  if (!mode || !moduleId || !resolveFrom) {
    return emit({ loaded: false, error: { message: "Usage: pine_engine_shim.cjs <mode> <moduleId> <resolveFrom> [source]" } }, 1);
  }

  // Resolve as if `require` were called from a file inside resolveFrom
  const req = createRequire(path.join(path.resolve(resolveFrom), "__pine_validate__.js"));

  let mod;
  try {
    mod = req(moduleId);
  } catch (e) {
    return emit({ loaded: false, ok: false, error: describe(e) });
  }

  const transpile = mod?.transpile;

  if (mode === "probe") {
    return emit({ loaded: true, transpile: typeof transpile === "function" });
  }

  if (mode !== "transpile") {
    return emit({ ok: false, error: { message: "Unknown shim mode: " + mode } }, 1);
  }

  if (typeof transpile !== "function") {
    return emit({ ok: false, error: { message: "Module does not export transpile()" } });
  }

  let source;
  try {
    source = fs.readFileSync(sourcePath, "utf8");
  } catch (e) {
    return emit({ ok: false, error: describe(e) }, 1);
  }

  let output;
  try {
    output = transpile(source);
  } catch (e) {
    return emit({ ok: false, error: describe(e) });
  }

  // undefined and functions do not survive JSON; report them as null
  let encoded = null;
  try {
    encoded = output === undefined ? null : JSON.parse(JSON.stringify(output) ?? "null");
  } catch (_) {
    encoded = { type: typeof output };
  }

  return emit({ ok: true, output: encoded });
}

process.exitCode = main();
"#
}
