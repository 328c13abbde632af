//! Unit tests for the script-facing fs module

use crate::common::{run, Script};
use builtins::CaptureSink;
use node_process::{HostEnvironment, JsContext, ProcessOutcome};
use std::fs;
use std::sync::Arc;

fn context(env: &HostEnvironment) -> JsContext {
    JsContext::new(env, "fs", Arc::new(CaptureSink::new())).unwrap()
}

fn eval(context: &mut JsContext, source: &str) -> String {
    context.evaluate_script(source).unwrap();
    context.drain_event_loop().unwrap();
    context.property("result").to_string()
}

#[test]
fn write_file_then_readdir() {
    let dir = tempfile::tempdir().unwrap();
    let env = HostEnvironment::new(dir.path());
    let script = Script::new(
        "var fs = require('fs');
         fs.writeFile('test.txt', 'Hello, World!', function (err) {
             if (err) { return console.log(err); }
             console.log('The file was saved!');
             fs.readdir('.', function (err, files) {
                 global.files = files;
             });
         });",
    )
    .on_done(|context| {
        assert_eq!(context.property("files").to_string(), "test.txt");
    });
    let result = run(&env, "_", script);

    assert_eq!(result.outcome, ProcessOutcome::Exited(0));
    assert_eq!(result.console, vec!["The file was saved!"]);
    let written = fs::read_to_string(env.home_dir("_").join("test.txt")).unwrap();
    assert_eq!(written, "Hello, World!");
}

#[test]
fn forbidden_paths_report_eacces_through_callbacks() {
    let dir = tempfile::tempdir().unwrap();
    let env = HostEnvironment::new(dir.path());
    let script = Script::new(
        "var fs = require('fs');
         fs.writeFile('/etc/passwd', 'x', function (err) { global.a = err; });
         fs.readdir('/data', function (err) { global.b = err; });
         fs.writeFile('../../escape.txt', 'x', function (err) { global.c = err; });
         fs.writeFile('/home/public/x.txt', 'x', function (err) { global.d = err; });
         fs.mkdir('/home/temp/../../root', function (err) { global.e = err; });",
    )
    .on_done(|context| {
        for name in ["a", "c", "d", "e"] {
            let error = context.property(name).to_string();
            assert!(error.contains("EACCES"), "{} was {}", name, error);
        }
        let b = context.property("b").to_string();
        assert!(b.contains("EACCES") || b.contains("ENOENT"), "b was {}", b);
    });
    let result = run(&env, "naughty", script);
    assert_eq!(result.outcome, ProcessOutcome::Exited(0));
    assert!(!dir.path().join("escape.txt").exists());
}

#[test]
fn error_objects_carry_node_fields() {
    let dir = tempfile::tempdir().unwrap();
    let env = HostEnvironment::new(dir.path());
    let mut context = context(&env);
    let result = eval(
        &mut context,
        "var result;
         require('fs').readFile('missing.txt', function (err, data) {
             result = [err.code, err.errno, err.syscall, err.path, err.message, data === undefined].join('|');
         });",
    );
    assert_eq!(
        result,
        "ENOENT|-2|open|missing.txt|ENOENT: no such file or directory, open 'missing.txt'|true"
    );
}

#[test]
fn callbacks_run_after_the_current_turn() {
    let dir = tempfile::tempdir().unwrap();
    let env = HostEnvironment::new(dir.path());
    let mut context = context(&env);
    let result = eval(
        &mut context,
        "var order = [];
         require('fs').writeFile('/etc/passwd', 'x', function (err) { order.push(err.code); });
         order.push('sync');
         var result = order;",
    );
    assert_eq!(result, "sync,EACCES");
}

#[test]
fn async_round_trip_of_the_directory_api() {
    let dir = tempfile::tempdir().unwrap();
    let env = HostEnvironment::new(dir.path());
    let mut context = context(&env);
    let result = eval(
        &mut context,
        "var fs = require('fs'), result;
         fs.mkdir('a/b', { recursive: true }, function (err) {
             fs.writeFile('a/b/one.txt', 'one', function () {
                 fs.appendFile('a/b/one.txt', '+1', function () {
                     fs.rename('a/b/one.txt', 'a/two.txt', function () {
                         fs.readFile('a/two.txt', 'utf8', function (err, data) {
                             fs.stat('a', function (err, stats) {
                                 fs.exists('a/b/one.txt', function (exists) {
                                     result = [data, stats.isDirectory(), exists].join(' ');
                                 });
                             });
                         });
                     });
                 });
             });
         });",
    );
    assert_eq!(result, "one+1 true false");
    assert!(env.home_dir("fs").join("a/two.txt").is_file());
}

#[test]
fn sync_api_throws_the_same_errors() {
    let dir = tempfile::tempdir().unwrap();
    let env = HostEnvironment::new(dir.path());
    let mut context = context(&env);
    let result = eval(
        &mut context,
        "var fs = require('fs'), result;
         fs.writeFileSync('note.txt', 'hi');
         var seen = [fs.readFileSync('note.txt'), fs.existsSync('note.txt'), fs.statSync('note.txt').size];
         try { fs.readdirSync('/etc') } catch (e) { seen.push(e.code) }
         try { fs.rmdirSync('nothing') } catch (e) { seen.push(e.code) }
         fs.unlinkSync('note.txt');
         seen.push(fs.readdirSync('/home').length);
         result = seen.join(',');",
    );
    assert_eq!(result, "hi,true,2,EACCES,ENOENT,0");
}

#[test]
fn temp_mount_is_writable_and_separate() {
    let dir = tempfile::tempdir().unwrap();
    let env = HostEnvironment::new(dir.path());
    let mut context = context(&env);
    eval(&mut context, "require('fs').writeFileSync('/home/temp/scratch', 'tmp'); var result;");
    let scratch = env.temp_dir("fs").join("scratch");
    assert_eq!(fs::read_to_string(scratch).unwrap(), "tmp");
}

#[test]
fn public_mount_is_read_only() {
    let dir = tempfile::tempdir().unwrap();
    let public = tempfile::tempdir().unwrap();
    fs::write(public.path().join("shared.txt"), "shared").unwrap();
    let env = HostEnvironment::new(dir.path()).with_public_dir(public.path());
    let mut context = context(&env);
    let result = eval(
        &mut context,
        "var fs = require('fs'), result = fs.readFileSync('/home/public/shared.txt');
         try { fs.writeFileSync('/home/public/shared.txt', 'mine') } catch (e) { result += ' ' + e.code }",
    );
    assert_eq!(result, "shared EACCES");
    assert_eq!(fs::read_to_string(public.path().join("shared.txt")).unwrap(), "shared");
}

#[test]
fn missing_callback_is_a_type_error() {
    let dir = tempfile::tempdir().unwrap();
    let env = HostEnvironment::new(dir.path());
    let mut context = context(&env);
    let result = eval(
        &mut context,
        "var result;
         try { require('fs').readdir('.') } catch (e) { result = e.name + ': ' + e.message }",
    );
    assert_eq!(
        result,
        "TypeError: The \"cb\" argument must be of type function. Received type string ('.')"
    );
}
