//! The sample lesson offered by the "Add demo C lesson" action.

use crate::types::{LessonPayload, LessonStatus};

pub const DEMO_TITLE: &str = "C Programming Fundamentals: Variables, Loops, Functions & Arrays";

pub const DEMO_EXCERPT: &str = "Master C programming fundamentals with practical examples covering variables, conditions, loops, functions, and arrays.";

pub const DEMO_META_DESCRIPTION: &str = "A complete beginner-friendly C programming lesson with examples, explanations, and practice challenge.";

pub const DEMO_CONTENT: &str = r#"# C Programming Fundamentals

Welcome to this practical C programming lesson. In this guide, we'll build a strong foundation using variables, loops, conditions, functions, and arrays.

## 1) Your first C program

```c
#include <stdio.h>

int main() {
  printf("Hello from ProgLearn!\n");
  return 0;
}
```

## 2) Variables and data types

C is statically typed. You must declare a variable before using it.

```c
int age = 21;
float gpa = 8.7f;
char grade = 'A';
```

## 3) Conditionals

```c
if (age >= 18) {
  printf("You are an adult.\n");
} else {
  printf("You are a minor.\n");
}
```

## 4) Loops

```c
for (int i = 1; i <= 5; i++) {
  printf("Step %d\n", i);
}
```

## 5) Functions

```c
int add(int a, int b) {
  return a + b;
}

int main() {
  printf("Sum: %d\n", add(4, 5));
  return 0;
}
```

## 6) Arrays

```c
int scores[] = {90, 85, 92, 88};
int size = sizeof(scores) / sizeof(scores[0]);

for (int i = 0; i < size; i++) {
  printf("Score %d: %d\n", i + 1, scores[i]);
}
```

## Practice Challenge

Write a C program that accepts 5 integers and prints the largest value.

> Tip: Use a loop and a running maximum variable.

Happy coding!"#;

/// Create payload for the published demo lesson.
#[must_use]
pub fn demo_lesson() -> LessonPayload {
    LessonPayload {
        title: DEMO_TITLE.to_string(),
        content: DEMO_CONTENT.to_string(),
        featured_image: String::new(),
        status: LessonStatus::Published,
        category_id: None,
        excerpt: DEMO_EXCERPT.to_string(),
        meta_description: DEMO_META_DESCRIPTION.to_string(),
        code_snippets: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_lesson_is_published_and_complete() {
        let demo = demo_lesson();
        assert_eq!(demo.status, LessonStatus::Published);
        assert!(demo.content.contains("## Practice Challenge"));
        assert!(demo.excerpt.chars().count() <= crate::text::EXCERPT_MAX_CHARS);
        assert!(demo.meta_description.chars().count() <= crate::text::META_DESCRIPTION_MAX_CHARS);
    }
}
